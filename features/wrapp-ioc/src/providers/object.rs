use std::sync::Arc;

use futures::{future::BoxFuture, FutureExt};

use super::{Provider, ProviderSpec, ProviderType};
use crate::{
    errors::ContainerError,
    types::{Dependency, Instance},
};

/// Hands out a value that already exists
pub struct ObjectProvider {
    name: String,
    value: Instance,
}

impl ObjectProvider {
    pub fn new(name: impl Into<String>, value: Instance) -> Self {
        ObjectProvider {
            name: name.into(),
            value,
        }
    }
}

impl Provider for ObjectProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> &[Dependency] {
        &[]
    }

    fn create(&self) -> BoxFuture<'_, Result<Instance, ContainerError>> {
        let value = self.value.clone();
        async move { Ok(value) }.boxed()
    }
}

/// Registered as `@providers/Object`
pub struct ObjectProviderType;

impl ProviderType for ObjectProviderType {
    fn create(&self, mut spec: ProviderSpec) -> Result<Arc<dyn Provider>, ContainerError> {
        let value = spec.take_target::<Instance>()?;
        Ok(Arc::new(ObjectProvider::new(spec.name, value)))
    }
}
