use std::sync::Arc;

use futures::{future::BoxFuture, FutureExt};

use super::{setup_instance, Scope, ScopeOptions, ScopeType};
use crate::{errors::ContainerError, providers::Provider, types::Instance};

/// Asks the provider on every request and copies the result per [CloneMode](super::CloneMode)
pub struct CloneScope {
    provider: Arc<dyn Provider>,
    options: ScopeOptions,
}

impl CloneScope {
    pub fn new(provider: Arc<dyn Provider>, options: ScopeOptions) -> Self {
        CloneScope { provider, options }
    }
}

impl Scope for CloneScope {
    fn get(&self) -> BoxFuture<'_, Result<Instance, ContainerError>> {
        async move {
            let name = self.provider.name();
            let provided = self.provider.create().await?;
            let instance = self.options.clone.apply(name, provided).await?;
            setup_instance(&self.options, name, &instance).await?;
            Ok(instance)
        }
        .boxed()
    }
}

/// Registered as `@scopes/Clone`
pub struct CloneScopeType;

impl ScopeType for CloneScopeType {
    fn create(
        &self,
        provider: Arc<dyn Provider>,
        options: ScopeOptions,
    ) -> Result<Arc<dyn Scope>, ContainerError> {
        Ok(Arc::new(CloneScope::new(provider, options)))
    }
}
