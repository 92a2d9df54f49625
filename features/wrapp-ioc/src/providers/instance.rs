use std::sync::Arc;

use futures::{future::BoxFuture, FutureExt};

use super::{
    resolve_dependencies, run_hook, Hook, Provider, ProviderSpec, ProviderType, DEINITIALIZE,
    INITIALIZE,
};
use crate::{
    container::WeakContainer,
    errors::ContainerError,
    target::Constructor,
    types::{Dependency, DynError, Instance},
};

/// Builds values with a [Constructor] and runs their lifecycle hooks
pub struct InstanceProvider {
    name: String,
    container: WeakContainer,
    constructor: Constructor,
    dependencies: Vec<Dependency>,
    initialize: Hook,
    deinitialize: Hook,
}

impl Provider for InstanceProvider {
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
                .constructor
                .construct(args)
                .map_err(|error| ContainerError::ConstructionFailed {
                    binding: self.name.clone(),
                    error: Arc::new(error),
                })?;
            tracing::debug!("Constructed instance of \"{}\"", self.name);

            run_hook(&self.name, self, instance.clone(), &self.initialize, INITIALIZE).await?;

            Ok(instance)
        }
        .boxed()
    }

    fn deinitialize_instance(
        &self,
        instance: Option<Instance>,
    ) -> BoxFuture<'_, Result<(), ContainerError>> {
        async move {
            let Some(instance) = instance else {
                return Ok(());
            };
            run_hook(&self.name, self, instance, &self.deinitialize, DEINITIALIZE).await
        }
        .boxed()
    }

    fn call_hook(
        &self,
        instance: Instance,
        name: &str,
    ) -> BoxFuture<'static, Option<Result<(), DynError>>> {
        self.constructor.call_hook(instance, name)
    }
}

/// Registered as `@providers/Instance`
pub struct InstanceProviderType;

impl ProviderType for InstanceProviderType {
    fn create(&self, mut spec: ProviderSpec) -> Result<Arc<dyn Provider>, ContainerError> {
        let constructor = spec.take_target::<Constructor>()?;

        Ok(Arc::new(InstanceProvider {
            name: spec.name,
            container: spec.container,
            constructor,
            dependencies: spec.dependencies,
            initialize: spec.initialize,
            deinitialize: spec.deinitialize,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{providers::{HookFuture, Lifecycle}, types::DynError};

    #[derive(Default)]
    struct Connection {
        opened: AtomicUsize,
        closed: AtomicUsize,
    }

    impl Lifecycle for Connection {
        fn lifecycle_hook(&self, name: &str) -> Option<HookFuture<'_>> {
            let counter = match name {
                "initialize" => &self.opened,
                "close" => &self.closed,
                _ => return None,
            };
            Some(
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
                .boxed(),
            )
        }
    }

    fn provider(initialize: impl Into<Hook>, deinitialize: impl Into<Hook>) -> Arc<dyn Provider> {
        let mut spec = ProviderSpec::new(
            "Connection",
            WeakContainer::default(),
            Constructor::new(|_| Ok(Connection::default())),
        );
        spec.initialize = initialize.into();
        spec.deinitialize = deinitialize.into();

        InstanceProviderType.create(spec).unwrap()
    }

    #[tokio::test]
    async fn runs_the_configured_hooks() {
        let provider = provider(true, "close");

        let instance = provider.create().await.unwrap();
        provider
            .deinitialize_instance(Some(instance.clone()))
            .await
            .unwrap();

        let connection = instance.downcast::<Connection>().unwrap();
        assert_eq!(connection.opened.load(Ordering::SeqCst), 1);
        assert_eq!(connection.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn skips_hooks_when_disabled() {
        let provider = provider(false, false);

        let instance = provider.create().await.unwrap();
        provider.deinitialize_instance(Some(instance.clone())).await.unwrap();
        provider.deinitialize_instance(None).await.unwrap();

        let connection = instance.downcast::<Connection>().unwrap();
        assert_eq!(connection.opened.load(Ordering::SeqCst), 0);
        assert_eq!(connection.closed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fails_on_missing_lifecycle_methods() {
        let provider = provider("connect", false);

        let error = provider.create().await.unwrap_err();
        assert!(matches!(
            error,
            ContainerError::MissingLifecycleMethod { ref method, .. } if method == "connect"
        ));
    }

    #[tokio::test]
    async fn reports_constructor_errors() {
        let spec = ProviderSpec::new(
            "Broken",
            WeakContainer::default(),
            Constructor::new::<Connection, _>(|_| Err(DynError::from("no database"))),
        );
        let provider = InstanceProviderType.create(spec).unwrap();

        let error = provider.create().await.unwrap_err();
        assert!(matches!(error, ContainerError::ConstructionFailed { .. }));
        assert!(error.to_string().contains("no database"));
    }
}
