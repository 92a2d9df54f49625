use std::sync::Arc;

use futures::{future::BoxFuture, FutureExt};

use super::{run_hook, Hook, Provider, DEINITIALIZE};
use crate::{
    errors::ContainerError,
    types::{Dependency, DynError, Instance},
};

/// Serves the values of a factory under another name
///
/// Teardown is decided by the link, not by the linked factory.
pub struct LinkProvider {
    name: String,
    factory: Arc<dyn Provider>,
    deinitialize: Hook,
}

impl LinkProvider {
    pub fn new(name: impl Into<String>, factory: Arc<dyn Provider>, deinitialize: Hook) -> Self {
        LinkProvider {
            name: name.into(),
            factory,
            deinitialize,
        }
    }
}

impl Provider for LinkProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> &[Dependency] {
        self.factory.dependencies()
    }

    fn create(&self) -> BoxFuture<'_, Result<Instance, ContainerError>> {
        self.factory.create()
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
        self.factory.call_hook(instance, name)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{
        container::WeakContainer,
        providers::{FactoryProviderType, HookFuture, Lifecycle, ProviderSpec, ProviderType},
        target::FactoryFn,
    };

    static CLOSED: AtomicUsize = AtomicUsize::new(0);

    struct Socket;

    impl Lifecycle for Socket {
        fn lifecycle_hook(&self, name: &str) -> Option<HookFuture<'_>> {
            (name == "close").then(|| {
                async {
                    CLOSED.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
                .boxed()
            })
        }
    }

    fn factory(target: FactoryFn) -> Arc<dyn Provider> {
        let spec = ProviderSpec::new("Socket", WeakContainer::default(), target);
        FactoryProviderType.create(spec).unwrap()
    }

    #[tokio::test]
    async fn runs_the_hook_chosen_by_the_link() {
        let link = LinkProvider::new(
            "Primary",
            factory(FactoryFn::with_lifecycle(|_| async { Ok::<_, DynError>(Socket) })),
            Hook::from("close"),
        );

        let socket = link.create().await.unwrap();
        link.deinitialize_instance(Some(socket)).await.unwrap();

        assert_eq!(CLOSED.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_hooks_fail_the_teardown() {
        let plain = LinkProvider::new(
            "Plain",
            factory(FactoryFn::new(|_| async { Ok::<_, DynError>(Socket) })),
            Hook::Default,
        );
        let socket = plain.create().await.unwrap();

        assert!(matches!(
            plain.deinitialize_instance(Some(socket)).await,
            Err(ContainerError::MissingLifecycleMethod { binding, method })
                if binding == "Plain" && method == "deinitialize"
        ));
    }
}
