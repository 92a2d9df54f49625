use std::{fmt::Debug, sync::Arc};

use crate::{
    providers::Hook,
    scopes::{CloneMode, ScopeKind, ScopeOptions, Setup},
    target::{CachingResolver, CatalogResolver, TargetResolver},
};

/// Settings shared by a container and all of its children
#[derive(Clone)]
pub struct ContainerOptions {
    default_scope: ScopeKind,
    resolver: Arc<dyn TargetResolver>,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        ContainerOptions {
            default_scope: ScopeKind::Singleton,
            resolver: Arc::new(CachingResolver::new(CatalogResolver::new())),
        }
    }
}

impl ContainerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope used by declarations which do not name one
    pub fn with_default_scope(mut self, scope: impl Into<ScopeKind>) -> Self {
        self.default_scope = scope.into();
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn TargetResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Resolves target paths from the catalog, caching every hit
    pub fn with_catalog(self, catalog: CatalogResolver) -> Self {
        self.with_resolver(Arc::new(CachingResolver::new(catalog)))
    }

    pub fn default_scope(&self) -> &ScopeKind {
        &self.default_scope
    }

    pub fn resolver(&self) -> &dyn TargetResolver {
        self.resolver.as_ref()
    }
}

impl Debug for ContainerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerOptions")
            .field("default_scope", &self.default_scope)
            .finish_non_exhaustive()
    }
}

/// Options of [Container::bind_instance](crate::Container::bind_instance)
#[derive(Debug, Clone, Default)]
pub struct InstanceOptions {
    pub scope: Option<ScopeKind>,
    pub initialize: Hook,
    /// Registers the binding for [Container::shutdown](crate::Container::shutdown)
    pub deinitialize: Hook,
    pub setup: Option<Setup>,
    pub track_instances: bool,
}

impl InstanceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope(mut self, scope: impl Into<ScopeKind>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_initialize(mut self, hook: impl Into<Hook>) -> Self {
        self.initialize = hook.into();
        self
    }

    pub fn with_deinitialize(mut self, hook: impl Into<Hook>) -> Self {
        self.deinitialize = hook.into();
        self
    }

    pub fn with_setup(mut self, setup: Setup) -> Self {
        self.setup = Some(setup);
        self
    }

    pub fn with_track_instances(mut self, track: bool) -> Self {
        self.track_instances = track;
        self
    }

    pub(crate) fn scope_options(&self) -> ScopeOptions {
        ScopeOptions {
            setup: self.setup.clone(),
            clone: CloneMode::Shared,
            track_instances: self.track_instances,
        }
    }
}

/// Options of [Container::bind_object](crate::Container::bind_object)
///
/// Objects always live in the Clone scope.
#[derive(Debug, Clone, Default)]
pub struct ObjectOptions {
    pub clone: CloneMode,
    pub setup: Option<Setup>,
}

impl ObjectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clone(mut self, clone: impl Into<CloneMode>) -> Self {
        self.clone = clone.into();
        self
    }

    pub fn with_setup(mut self, setup: Setup) -> Self {
        self.setup = Some(setup);
        self
    }

    pub(crate) fn scope_options(self) -> ScopeOptions {
        ScopeOptions {
            setup: self.setup,
            clone: self.clone,
            track_instances: false,
        }
    }
}

/// Options of [Container::bind_link](crate::Container::bind_link)
#[derive(Debug, Clone, Default)]
pub struct LinkOptions {
    pub scope: Option<ScopeKind>,
    /// Hook run on the linked values during [Container::shutdown](crate::Container::shutdown)
    pub deinitialize: Hook,
    pub setup: Option<Setup>,
    pub track_instances: bool,
}

impl LinkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope(mut self, scope: impl Into<ScopeKind>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_deinitialize(mut self, hook: impl Into<Hook>) -> Self {
        self.deinitialize = hook.into();
        self
    }

    pub fn with_setup(mut self, setup: Setup) -> Self {
        self.setup = Some(setup);
        self
    }

    pub fn with_track_instances(mut self, track: bool) -> Self {
        self.track_instances = track;
        self
    }

    pub(crate) fn scope_options(&self) -> ScopeOptions {
        ScopeOptions {
            setup: self.setup.clone(),
            clone: CloneMode::Shared,
            track_instances: self.track_instances,
        }
    }
}

/// Options of [Container::bind_function](crate::Container::bind_function)
#[derive(Debug, Clone, Default)]
pub struct FunctionOptions {
    pub scope: Option<ScopeKind>,
    pub setup: Option<Setup>,
}

impl FunctionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope(mut self, scope: impl Into<ScopeKind>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_setup(mut self, setup: Setup) -> Self {
        self.setup = Some(setup);
        self
    }

    pub(crate) fn scope_options(self) -> ScopeOptions {
        ScopeOptions {
            setup: self.setup,
            ..Default::default()
        }
    }
}
