//! Providers know how to create the value of a binding
//!
//! Every provider variant is produced by a [ProviderType] registered
//! in the container under `@providers/<kind>`.

use std::{fmt::Debug, sync::Arc};

use futures::{future::BoxFuture, FutureExt};

use crate::{
    container::WeakContainer,
    errors::ContainerError,
    target::{Target, TargetKind},
    types::{Args, Dependency, DynError, Injectable, Instance},
};

pub mod factory;
pub mod function;
pub mod instance;
pub mod link;
pub mod object;

pub use factory::{FactoryProvider, FactoryProviderType};
pub use function::{BoundFunction, FunctionProvider, FunctionProviderType};
pub use instance::{InstanceProvider, InstanceProviderType};
pub use link::LinkProvider;
pub use object::{ObjectProvider, ObjectProviderType};

pub const INITIALIZE: &str = "initialize";
pub const DEINITIALIZE: &str = "deinitialize";

pub type HookFuture<'a> = BoxFuture<'a, Result<(), DynError>>;

/// Lifecycle methods of values built from a [Constructor](crate::target::Constructor)
///
/// Hooks are looked up by name, so `initialize`, `deinitialize`
/// or any custom name configured on the binding can be served.
///
/// ```ignore
/// impl Lifecycle for Database {
///     fn lifecycle_hook(&self, name: &str) -> Option<HookFuture<'_>> {
///         match name {
///             "initialize" => Some(self.connect().boxed()),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Lifecycle: Injectable {
    fn lifecycle_hook(&self, name: &str) -> Option<HookFuture<'_>> {
        let _ = name;
        None
    }
}

/// Whether and which lifecycle method to run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Hook {
    #[default]
    Disabled,
    /// Run the method with the default name
    Default,
    Named(String),
}

impl Hook {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Hook::Disabled)
    }

    pub fn method_name<'a>(&'a self, default: &'a str) -> Option<&'a str> {
        match self {
            Hook::Disabled => None,
            Hook::Default => Some(default),
            Hook::Named(name) => Some(name),
        }
    }
}

impl From<bool> for Hook {
    fn from(enabled: bool) -> Self {
        if enabled {
            Hook::Default
        } else {
            Hook::Disabled
        }
    }
}

impl From<&str> for Hook {
    fn from(name: &str) -> Self {
        Hook::Named(name.to_string())
    }
}

impl From<String> for Hook {
    fn from(name: String) -> Self {
        Hook::Named(name)
    }
}

pub trait Provider: Send + Sync {
    /// Name of the binding this provider belongs to
    fn name(&self) -> &str;

    fn dependencies(&self) -> &[Dependency];

    /// Creates a new value, resolving dependencies first
    fn create(&self) -> BoxFuture<'_, Result<Instance, ContainerError>>;

    /// Tears down a value created by this provider
    fn deinitialize_instance(
        &self,
        instance: Option<Instance>,
    ) -> BoxFuture<'_, Result<(), ContainerError>> {
        let _ = instance;
        async { Ok(()) }.boxed()
    }

    /// Runs the named [Lifecycle] hook of a value created by this provider
    ///
    /// Resolves to None if the value has no such hook.
    fn call_hook(
        &self,
        instance: Instance,
        name: &str,
    ) -> BoxFuture<'static, Option<Result<(), DynError>>> {
        let _ = (instance, name);
        async { None }.boxed()
    }
}

impl Debug for dyn Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name())
            .field("dependencies", &self.dependencies())
            .finish()
    }
}

/// Everything a [ProviderType] gets to build a provider
#[derive(Debug, Clone)]
pub struct ProviderSpec {
    pub name: String,
    pub container: WeakContainer,
    pub target: Target,
    pub dependencies: Vec<Dependency>,
    pub initialize: Hook,
    pub deinitialize: Hook,
}

impl ProviderSpec {
    pub fn new(name: impl Into<String>, container: WeakContainer, target: impl Into<Target>) -> Self {
        ProviderSpec {
            name: name.into(),
            container,
            target: target.into(),
            dependencies: Vec::new(),
            initialize: Hook::Disabled,
            deinitialize: Hook::Disabled,
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Takes the target out of the spec if it is of the expected kind
    pub fn take_target<T: TargetKind>(&mut self) -> Result<T, ContainerError> {
        let actual = self.target.kind();
        let target = std::mem::replace(&mut self.target, Target::Value(Instance::new(())));
        T::from_target(target).ok_or_else(|| ContainerError::InvalidTarget {
            binding: self.name.clone(),
            expected: T::KIND,
            actual,
        })
    }
}

/// Creates providers of one kind
pub trait ProviderType: Send + Sync {
    fn create(&self, spec: ProviderSpec) -> Result<Arc<dyn Provider>, ContainerError>;
}

/// Runs `hook` on a value of `provider`, doing nothing if the hook is disabled
pub(crate) async fn run_hook(
    binding: &str,
    provider: &dyn Provider,
    instance: Instance,
    hook: &Hook,
    default: &str,
) -> Result<(), ContainerError> {
    let Some(method) = hook.method_name(default) else {
        return Ok(());
    };

    tracing::debug!("Running \"{method}\" of \"{binding}\"");
    match provider.call_hook(instance, method).await {
        Some(result) => result.map_err(|error| ContainerError::hook_failed(binding, method, error)),
        None => Err(ContainerError::MissingLifecycleMethod {
            binding: binding.to_string(),
            method: method.to_string(),
        }),
    }
}

/// Resolves dependencies in order through the container owning the binding
///
/// Placeholders are left empty.
pub(crate) async fn resolve_dependencies(
    container: &WeakContainer,
    binding: &str,
    dependencies: &[Dependency],
) -> Result<Args, ContainerError> {
    if dependencies.is_empty() {
        return Ok(Args::default());
    }

    let container = container
        .upgrade()
        .ok_or_else(|| ContainerError::ContainerDropped(binding.to_string()))?;

    let mut values = Vec::with_capacity(dependencies.len());
    for dependency in dependencies {
        let value = match dependency.name() {
            Some(name) => Some(container.resolve(name).await?),
            None => None,
        };
        values.push(value);
    }

    Ok(Args::new(values))
}

/// Handle returned when resolving `@factories/<name>`
///
/// Every call to [Factory::create] builds a new value.
#[derive(Clone)]
pub struct Factory {
    provider: Arc<dyn Provider>,
}

impl Factory {
    pub(crate) fn new(provider: Arc<dyn Provider>) -> Self {
        Factory { provider }
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }

    pub async fn create(&self) -> Result<Instance, ContainerError> {
        self.provider.create().await
    }

    pub async fn create_as<T: Injectable>(&self) -> Result<Arc<T>, ContainerError> {
        self.create().await?.downcast()
    }
}

impl Debug for Factory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Factory").field(&self.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hooks_map_to_method_names() {
        assert_eq!(Hook::from(false).method_name(INITIALIZE), None);
        assert_eq!(Hook::from(true).method_name(INITIALIZE), Some("initialize"));
        assert_eq!(Hook::from("deinit").method_name(DEINITIALIZE), Some("deinit"));
        assert!(!Hook::default().is_enabled());
    }

    #[test]
    fn specs_reject_targets_of_the_wrong_kind() {
        let mut spec = ProviderSpec::new("Service", WeakContainer::default(), Instance::new(1_u8));

        let error = spec.take_target::<crate::target::FactoryFn>().unwrap_err();
        assert!(matches!(
            error,
            ContainerError::InvalidTarget {
                expected: "factory",
                actual: "value",
                ..
            }
        ));
    }
}
