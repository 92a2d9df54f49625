use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Weak,
    },
};

use crate::{
    container::WeakContainer,
    errors::ContainerError,
    providers::{Factory, Provider, ProviderType},
    scopes::{Scope, ScopeType},
    state::State,
    types::{Dependency, Injectable, Instance},
    validator::{BindingLookup, ValidationError, Validator},
};

/// What resolving a binding yields
#[derive(Clone)]
pub enum BindingTarget {
    /// Values handed out by a scope
    Scoped(Arc<dyn Scope>),
    /// A [Factory] handle, bound under `@factories/<name>`
    Factory(Arc<dyn Provider>),
    /// Bound under `@providers/<name>`
    ProviderType(Arc<dyn ProviderType>),
    /// Bound under `@scopes/<name>`
    ScopeType(Arc<dyn ScopeType>),
}

impl BindingTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            BindingTarget::Scoped(_) => "scoped",
            BindingTarget::Factory(_) => "factory",
            BindingTarget::ProviderType(_) => "provider type",
            BindingTarget::ScopeType(_) => "scope type",
        }
    }
}

/// A named entry of a container
///
/// Validates its dependencies the first time it is resolved.
pub struct Binding {
    name: String,
    target: BindingTarget,
    dependencies: Vec<Dependency>,
    validated: AtomicBool,
    /// Container the binding was declared in, dependencies are looked up there
    owner: Weak<dyn BindingLookup>,
}

impl Binding {
    pub fn new(
        name: impl Into<String>,
        target: BindingTarget,
        dependencies: Vec<Dependency>,
        owner: Weak<dyn BindingLookup>,
    ) -> Self {
        Binding {
            name: name.into(),
            target,
            dependencies,
            validated: AtomicBool::new(false),
            owner,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &BindingTarget {
        &self.target
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn is_validated(&self) -> bool {
        self.validated.load(Ordering::Acquire)
    }

    /// Container the dependencies of this binding are looked up in
    pub(crate) fn owner(&self) -> Weak<dyn BindingLookup> {
        self.owner.clone()
    }

    /// Forces the next resolution to validate again
    pub fn invalidate(&self) {
        tracing::debug!("Invalidating \"{}\"", self.name);
        self.validated.store(false, Ordering::Release);
    }

    /// Checks that all dependencies can be resolved
    ///
    /// `state` is the path that led here, None when validation starts at this binding.
    pub fn validate(&self, state: Option<State>) -> Result<(), ValidationError> {
        if self.is_validated() {
            return Ok(());
        }

        if !self.dependencies.is_empty() {
            let owner = self
                .owner
                .upgrade()
                .ok_or_else(|| ValidationError::ContainerDropped(self.name.clone()))?;
            let state = state.unwrap_or_else(|| State::new(&self.name));

            Validator::new(owner.as_ref()).validate(&self.dependencies, &state)?;
            tracing::debug!("Validated dependencies of \"{}\"", self.name);
        }

        self.validated.store(true, Ordering::Release);
        Ok(())
    }

    /// Validates and produces the value of the binding
    pub async fn get(&self) -> Result<Instance, ContainerError> {
        self.validate(None)?;

        match &self.target {
            BindingTarget::Scoped(scope) => scope.get().await,
            BindingTarget::Factory(provider) => Ok(Instance::new(Factory::new(provider.clone()))),
            BindingTarget::ProviderType(provider_type) => Ok(Instance::new(provider_type.clone())),
            BindingTarget::ScopeType(scope_type) => Ok(Instance::new(scope_type.clone())),
        }
    }
}

impl Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("name", &self.name)
            .field("kind", &self.target.kind())
            .field("dependencies", &self.dependencies)
            .field("validated", &self.is_validated())
            .finish()
    }
}

/// Handle returned by the `bind_*` methods of a container
#[derive(Debug, Clone)]
pub struct Bound {
    name: String,
    container: WeakContainer,
}

impl Bound {
    pub(crate) fn new(name: impl Into<String>, container: WeakContainer) -> Self {
        Bound {
            name: name.into(),
            container,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolves the bound name in the container it was declared in
    pub async fn resolve(&self) -> Result<Instance, ContainerError> {
        let container = self
            .container
            .upgrade()
            .ok_or_else(|| ContainerError::ContainerDropped(self.name.clone()))?;
        container.resolve(&self.name).await
    }

    pub async fn resolve_as<T: Injectable>(&self) -> Result<Arc<T>, ContainerError> {
        self.resolve().await?.downcast()
    }
}
