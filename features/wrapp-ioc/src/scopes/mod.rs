//! Scopes decide how often a provider is asked for a new value
//!
//! Every scope variant is produced by a [ScopeType] registered
//! in the container under `@scopes/<kind>`.

use std::{any::type_name, fmt::Debug, future::Future, sync::Arc};

use futures::{future::BoxFuture, FutureExt};

use crate::{
    errors::ContainerError,
    providers::Provider,
    types::{DynError, Injectable, Instance},
};

pub mod clone;
pub mod prototype;
pub mod singleton;

pub use clone::{CloneScope, CloneScopeType};
pub use prototype::{PrototypeScope, PrototypeScopeType};
pub use singleton::{SingletonScope, SingletonScopeType};

pub trait Scope: Send + Sync {
    fn get(&self) -> BoxFuture<'_, Result<Instance, ContainerError>>;

    /// Releases the values held by the scope
    fn deinitialize(&self) -> BoxFuture<'_, Result<(), ContainerError>> {
        async { Ok(()) }.boxed()
    }
}

/// Creates scopes of one kind around a provider
pub trait ScopeType: Send + Sync {
    fn create(
        &self,
        provider: Arc<dyn Provider>,
        options: ScopeOptions,
    ) -> Result<Arc<dyn Scope>, ContainerError>;
}

/// Name of a registered scope type
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    #[default]
    Singleton,
    Prototype,
    Clone,
    Custom(String),
}

impl ScopeKind {
    pub fn name(&self) -> &str {
        match self {
            ScopeKind::Singleton => "Singleton",
            ScopeKind::Prototype => "Prototype",
            ScopeKind::Clone => "Clone",
            ScopeKind::Custom(name) => name,
        }
    }
}

impl From<&str> for ScopeKind {
    fn from(name: &str) -> Self {
        match name {
            "Singleton" => ScopeKind::Singleton,
            "Prototype" => ScopeKind::Prototype,
            "Clone" => ScopeKind::Clone,
            custom => ScopeKind::Custom(custom.to_string()),
        }
    }
}

impl std::fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Options handed to a [ScopeType] when wrapping a provider
#[derive(Debug, Clone, Default)]
pub struct ScopeOptions {
    /// Runs on every value the scope hands out for the first time
    pub setup: Option<Setup>,
    /// Used by the Clone scope
    pub clone: CloneMode,
    /// Used by the Prototype scope to deinitialize the values it created
    pub track_instances: bool,
}

type SetupCall = dyn Fn(Instance) -> Option<BoxFuture<'static, Result<(), DynError>>> + Send + Sync;

/// Callback run on freshly created values
///
/// The callback is typed, values of another type fail with
/// [ContainerError::InvalidSetupOption].
#[derive(Clone)]
pub struct Setup {
    expected: &'static str,
    call: Arc<SetupCall>,
}

impl Setup {
    pub fn new<T, F, Fut>(setup: F) -> Self
    where
        T: Injectable,
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), DynError>> + Send + 'static,
    {
        Setup {
            expected: type_name::<T>(),
            call: Arc::new(move |instance: Instance| {
                let value = instance.downcast::<T>().ok()?;
                Some(setup(value).boxed())
            }),
        }
    }

    pub fn sync<T, F>(setup: F) -> Self
    where
        T: Injectable,
        F: Fn(&T) -> Result<(), DynError> + Send + Sync + 'static,
    {
        Self::new(move |value: Arc<T>| futures::future::ready(setup(value.as_ref())))
    }

    pub(crate) async fn run(&self, binding: &str, instance: Instance) -> Result<(), ContainerError> {
        let actual = instance.type_name();
        let Some(setup) = (self.call)(instance) else {
            return Err(ContainerError::InvalidSetupOption {
                binding: binding.to_string(),
                expected: self.expected,
                actual,
            });
        };

        setup
            .await
            .map_err(|error| ContainerError::hook_failed(binding, "setup", error))
    }
}

impl Debug for Setup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Setup").field(&self.expected).finish()
    }
}

pub(crate) async fn setup_instance(
    options: &ScopeOptions,
    binding: &str,
    instance: &Instance,
) -> Result<(), ContainerError> {
    match &options.setup {
        Some(setup) => setup.run(binding, instance.clone()).await,
        None => Ok(()),
    }
}

type CloneCall = dyn Fn(Instance) -> Option<BoxFuture<'static, Result<Instance, DynError>>> + Send + Sync;

/// User supplied copy of a value
#[derive(Clone)]
pub struct CloneFn {
    expected: &'static str,
    call: Arc<CloneCall>,
}

impl CloneFn {
    pub fn new<T, U, F, Fut>(clone: F) -> Self
    where
        T: Injectable,
        U: Injectable,
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<U, DynError>> + Send + 'static,
    {
        CloneFn {
            expected: type_name::<T>(),
            call: Arc::new(move |instance: Instance| {
                let value = instance.downcast::<T>().ok()?;
                Some(clone(value).map(|copy| copy.map(Instance::new)).boxed())
            }),
        }
    }
}

impl Debug for CloneFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CloneFn").field(&self.expected).finish()
    }
}

/// How the Clone scope copies the provided value
#[derive(Debug, Clone, Default)]
pub enum CloneMode {
    /// Hand out the provided value as is
    #[default]
    Shared,
    /// Deep copy values created through [Instance::cloneable]
    Deep,
    With(CloneFn),
}

impl CloneMode {
    pub(crate) async fn apply(&self, binding: &str, instance: Instance) -> Result<Instance, ContainerError> {
        let invalid = |reason: String| ContainerError::InvalidCloneOption {
            binding: binding.to_string(),
            reason,
        };

        match self {
            CloneMode::Shared => Ok(instance),
            CloneMode::Deep => instance.deep_copy().ok_or_else(|| {
                invalid(format!(
                    "a '{}' can not be deep copied, bind it with Instance::cloneable",
                    instance.type_name()
                ))
            }),
            CloneMode::With(clone) => {
                let actual = instance.type_name();
                let Some(copy) = (clone.call)(instance) else {
                    return Err(invalid(format!(
                        "expected '{}' got '{actual}'",
                        clone.expected
                    )));
                };
                copy.await
                    .map_err(|error| ContainerError::hook_failed(binding, "clone", error))
            }
        }
    }
}

impl From<bool> for CloneMode {
    fn from(deep: bool) -> Self {
        if deep {
            CloneMode::Deep
        } else {
            CloneMode::Shared
        }
    }
}

impl From<CloneFn> for CloneMode {
    fn from(clone: CloneFn) -> Self {
        CloneMode::With(clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Settings {
        retries: u32,
    }

    #[test]
    fn scope_kinds_parse_builtin_names() {
        assert_eq!(ScopeKind::from("Prototype"), ScopeKind::Prototype);
        assert_eq!(ScopeKind::from("Request"), ScopeKind::Custom("Request".into()));
        assert_eq!(ScopeKind::Custom("Request".into()).name(), "Request");
        assert_eq!(ScopeKind::default().to_string(), "Singleton");
    }

    #[tokio::test]
    async fn setup_checks_the_value_type() {
        let setup = Setup::sync(|settings: &Settings| {
            assert_eq!(settings.retries, 3);
            Ok(())
        });

        setup
            .run("Settings", Instance::new(Settings { retries: 3 }))
            .await
            .unwrap();

        assert!(matches!(
            setup.run("Settings", Instance::new(3_u32)).await,
            Err(ContainerError::InvalidSetupOption { actual: "u32", .. })
        ));
    }

    #[tokio::test]
    async fn clone_modes() {
        let original = Instance::cloneable(Settings { retries: 1 });

        let shared = CloneMode::Shared.apply("S", original.clone()).await.unwrap();
        assert!(Instance::ptr_eq(&shared, &original));

        let deep = CloneMode::from(true).apply("S", original.clone()).await.unwrap();
        assert!(!Instance::ptr_eq(&deep, &original));

        let custom = CloneMode::from(CloneFn::new(|settings: Arc<Settings>| async move {
            Ok::<_, DynError>(Settings {
                retries: settings.retries + 1,
            })
        }));
        let copy = custom.apply("S", original).await.unwrap();
        assert_eq!(*copy.downcast::<Settings>().unwrap(), Settings { retries: 2 });
    }

    #[tokio::test]
    async fn deep_copies_need_cloneable_values() {
        let result = CloneMode::Deep.apply("S", Instance::new(Settings { retries: 1 })).await;

        assert!(matches!(result, Err(ContainerError::InvalidCloneOption { .. })));
    }
}
