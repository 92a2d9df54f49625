use std::{fmt::Debug, sync::Arc};

use futures::{future::BoxFuture, FutureExt};

use super::{resolve_dependencies, Provider, ProviderSpec, ProviderType};
use crate::{
    container::WeakContainer,
    errors::ContainerError,
    target::FunctionFn,
    types::{Args, Dependency, Injectable, Instance},
};

/// Produces a [BoundFunction] with all named dependencies already resolved
pub struct FunctionProvider {
    name: String,
    container: WeakContainer,
    function: FunctionFn,
    dependencies: Vec<Dependency>,
}

impl Provider for FunctionProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    fn create(&self) -> BoxFuture<'_, Result<Instance, ContainerError>> {
        async move {
            let args = resolve_dependencies(&self.container, &self.name, &self.dependencies).await?;

            Ok(Instance::new(BoundFunction {
                name: self.name.clone(),
                slots: args.into_inner(),
                function: self.function.clone(),
            }))
        }
        .boxed()
    }
}

/// Registered as `@providers/Function`
pub struct FunctionProviderType;

impl ProviderType for FunctionProviderType {
    fn create(&self, mut spec: ProviderSpec) -> Result<Arc<dyn Provider>, ContainerError> {
        let function = spec.take_target::<FunctionFn>()?;

        Ok(Arc::new(FunctionProvider {
            name: spec.name,
            container: spec.container,
            function,
            dependencies: spec.dependencies,
        }))
    }
}

/// A function with its injected arguments in place
///
/// Empty slots belong to placeholders and are filled from the arguments
/// given to [BoundFunction::call], in order.
#[derive(Clone)]
pub struct BoundFunction {
    name: String,
    slots: Vec<Option<Instance>>,
    function: FunctionFn,
}

impl BoundFunction {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Calls the function, filling the placeholders with `args`
    ///
    /// Placeholders left over once `args` is exhausted stay empty,
    /// surplus arguments are ignored.
    pub fn call<I>(&self, args: I) -> BoxFuture<'static, Result<Instance, ContainerError>>
    where
        I: IntoIterator,
        I::Item: Into<Option<Instance>>,
    {
        let mut args = args.into_iter().map(Into::into);
        let merged = self
            .slots
            .iter()
            .map(|slot| match slot {
                Some(injected) => Some(injected.clone()),
                None => args.next().flatten(),
            })
            .collect();

        let name = self.name.clone();
        let call = self.function.call(Args::new(merged));
        async move {
            call.await.map_err(|error| ContainerError::CallFailed {
                function: name,
                error: Arc::new(error),
            })
        }
        .boxed()
    }

    /// Calls the function without caller arguments
    pub fn invoke(&self) -> BoxFuture<'static, Result<Instance, ContainerError>> {
        self.call(std::iter::empty::<Instance>())
    }

    pub async fn call_as<T: Injectable, I>(&self, args: I) -> Result<Arc<T>, ContainerError>
    where
        I: IntoIterator,
        I::Item: Into<Option<Instance>>,
    {
        self.call(args).await?.downcast()
    }
}

impl Debug for BoundFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundFunction")
            .field("name", &self.name)
            .field("slots", &self.slots.len())
            .finish()
    }
}
