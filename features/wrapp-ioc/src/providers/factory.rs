use std::sync::Arc;

use futures::{future::BoxFuture, FutureExt};

use super::{resolve_dependencies, Provider, ProviderSpec, ProviderType};
use crate::{
    container::WeakContainer,
    errors::ContainerError,
    target::FactoryFn,
    types::{Dependency, DynError, Instance},
};

/// Calls an async [FactoryFn] with the resolved dependencies
pub struct FactoryProvider {
    name: String,
    container: WeakContainer,
    factory: FactoryFn,
    dependencies: Vec<Dependency>,
}

impl Provider for FactoryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    fn create(&self) -> BoxFuture<'_, Result<Instance, ContainerError>> {
        async move {
            let args = resolve_dependencies(&self.container, &self.name, &self.dependencies).await?;
            let instance = self
                .factory
                .call(args)
                .await
                .map_err(|error| ContainerError::ConstructionFailed {
                    binding: self.name.clone(),
                    error: Arc::new(error),
                })?;

            tracing::debug!("Factory \"{}\" produced a {}", self.name, instance.type_name());
            Ok(instance)
        }
        .boxed()
    }

    fn call_hook(
        &self,
        instance: Instance,
        name: &str,
    ) -> BoxFuture<'static, Option<Result<(), DynError>>> {
        self.factory.call_hook(instance, name)
    }
}

/// Registered as `@providers/Factory`
pub struct FactoryProviderType;

impl ProviderType for FactoryProviderType {
    fn create(&self, mut spec: ProviderSpec) -> Result<Arc<dyn Provider>, ContainerError> {
        let factory = spec.take_target::<FactoryFn>()?;

        Ok(Arc::new(FactoryProvider {
            name: spec.name,
            container: spec.container,
            factory,
            dependencies: spec.dependencies,
        }))
    }
}
