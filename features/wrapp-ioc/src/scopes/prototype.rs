use std::sync::Arc;

use futures::{future::BoxFuture, FutureExt};
use parking_lot::Mutex;

use super::{setup_instance, Scope, ScopeOptions, ScopeType};
use crate::{errors::ContainerError, providers::Provider, types::Instance};

/// Creates a new value on every request
///
/// With `track_instances` set, the created values are remembered
/// so [Scope::deinitialize] can tear them down.
pub struct PrototypeScope {
    provider: Arc<dyn Provider>,
    options: ScopeOptions,
    instances: Mutex<Vec<Instance>>,
}

impl PrototypeScope {
    pub fn new(provider: Arc<dyn Provider>, options: ScopeOptions) -> Self {
        PrototypeScope {
            provider,
            options,
            instances: Mutex::new(Vec::new()),
        }
    }
}

impl Scope for PrototypeScope {
    fn get(&self) -> BoxFuture<'_, Result<Instance, ContainerError>> {
        async move {
            let instance = self.provider.create().await?;
            setup_instance(&self.options, self.provider.name(), &instance).await?;

            if self.options.track_instances {
                self.instances.lock().push(instance.clone());
            }

            Ok(instance)
        }
        .boxed()
    }

    fn deinitialize(&self) -> BoxFuture<'_, Result<(), ContainerError>> {
        async move {
            let instances = std::mem::take(&mut *self.instances.lock());
            tracing::debug!(
                "Deinitializing {} instance(s) of \"{}\"",
                instances.len(),
                self.provider.name()
            );

            let mut first_error = None;
            for instance in instances {
                if let Err(error) = self.provider.deinitialize_instance(Some(instance)).await {
                    tracing::warn!("Failed to deinitialize \"{}\": {error}", self.provider.name());
                    first_error.get_or_insert(error);
                }
            }

            first_error.map_or(Ok(()), Err)
        }
        .boxed()
    }
}

/// Registered as `@scopes/Prototype`
pub struct PrototypeScopeType;

impl ScopeType for PrototypeScopeType {
    fn create(
        &self,
        provider: Arc<dyn Provider>,
        options: ScopeOptions,
    ) -> Result<Arc<dyn Scope>, ContainerError> {
        Ok(Arc::new(PrototypeScope::new(provider, options)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{
        container::WeakContainer,
        providers::{HookFuture, InstanceProviderType, Lifecycle, ProviderSpec, ProviderType},
        target::Constructor,
    };

    static CLOSED: AtomicUsize = AtomicUsize::new(0);

    struct Session;

    impl Lifecycle for Session {
        fn lifecycle_hook(&self, name: &str) -> Option<HookFuture<'_>> {
            (name == "deinitialize").then(|| {
                async {
                    CLOSED.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
                .boxed()
            })
        }
    }

    fn scope(track_instances: bool) -> PrototypeScope {
        let mut spec = ProviderSpec::new(
            "Session",
            WeakContainer::default(),
            Constructor::new(|_| Ok(Session)),
        );
        spec.deinitialize = true.into();
        let provider = InstanceProviderType.create(spec).unwrap();

        PrototypeScope::new(
            provider,
            ScopeOptions {
                track_instances,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn creates_new_values_and_tears_down_tracked_ones() {
        let untracked = scope(false);
        let first = untracked.get().await.unwrap();
        let second = untracked.get().await.unwrap();
        assert!(!Instance::ptr_eq(&first, &second));

        untracked.deinitialize().await.unwrap();
        assert_eq!(CLOSED.load(Ordering::SeqCst), 0);

        let tracked = scope(true);
        tracked.get().await.unwrap();
        tracked.get().await.unwrap();
        tracked.deinitialize().await.unwrap();
        assert_eq!(CLOSED.load(Ordering::SeqCst), 2);

        tracked.deinitialize().await.unwrap();
        assert_eq!(CLOSED.load(Ordering::SeqCst), 2);
    }
}
