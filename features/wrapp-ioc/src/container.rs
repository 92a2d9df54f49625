use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{Arc, Weak},
};

use futures::{future::BoxFuture, FutureExt};
use parking_lot::{Mutex, RwLock};

use crate::{
    binding::{Binding, BindingTarget, Bound},
    errors::ContainerError,
    options::{ContainerOptions, FunctionOptions, InstanceOptions, LinkOptions, ObjectOptions},
    providers::{
        FactoryProviderType, FunctionProviderType, InstanceProviderType, LinkProvider,
        ObjectProvider, ObjectProviderType, Provider, ProviderSpec, ProviderType,
    },
    scopes::{
        CloneScope, CloneScopeType, PrototypeScopeType, Scope, ScopeKind, ScopeOptions,
        ScopeType, SingletonScopeType,
    },
    target::{Constructor, FactoryFn, FunctionFn, Target, TargetRef, TargetResolver},
    types::{dependencies_of, Dependency, Injectable, Instance},
    validator::BindingLookup,
};

/// Resolves to a [WeakContainer] of the container itself
pub const SELF_BINDING: &str = "@containers/self";
/// Resolves to the parent of a child container
pub const PARENT_BINDING: &str = "@containers/parent";
pub const PROVIDERS_PREFIX: &str = "@providers/";
pub const SCOPES_PREFIX: &str = "@scopes/";
pub const FACTORIES_PREFIX: &str = "@factories/";

/// Registry of named bindings
///
/// Cloning the container clones the handle, all clones share the same bindings.
#[derive(Clone)]
pub struct Container(pub(crate) Arc<ContainerInner>);

pub(crate) struct ContainerInner {
    bindings: RwLock<HashMap<String, Arc<Binding>>>,
    parent: Option<Container>,
    /// Scopes deinitialized on shutdown, in declaration order
    teardown: Mutex<Vec<(String, Arc<dyn Scope>)>>,
    options: ContainerOptions,
}

impl BindingLookup for ContainerInner {
    fn find_binding(&self, name: &str) -> Option<Arc<Binding>> {
        let local = self.bindings.read().get(name).cloned();
        local.or_else(|| self.parent.as_ref()?.find_binding(name))
    }
}

/// Non owning handle, held by providers and bindings
#[derive(Clone, Default)]
pub struct WeakContainer(Weak<ContainerInner>);

impl WeakContainer {
    pub fn upgrade(&self) -> Option<Container> {
        self.0.upgrade().map(Container)
    }
}

impl Debug for WeakContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.0.strong_count() > 0 {
            "alive"
        } else {
            "dropped"
        };
        f.debug_tuple("WeakContainer").field(&state).finish()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    /// Creates a root container with the built-in providers and scopes
    pub fn with_options(options: ContainerOptions) -> Self {
        let container = Self::create(None, options);

        let scope_types: [(&str, Arc<dyn ScopeType>); 3] = [
            ("Singleton", Arc::new(SingletonScopeType)),
            ("Prototype", Arc::new(PrototypeScopeType)),
            ("Clone", Arc::new(CloneScopeType)),
        ];
        for (name, scope_type) in scope_types {
            container.insert(
                format!("{SCOPES_PREFIX}{name}"),
                BindingTarget::ScopeType(scope_type),
                Vec::new(),
            );
        }

        let provider_types: [(&str, Arc<dyn ProviderType>); 4] = [
            ("Instance", Arc::new(InstanceProviderType)),
            ("Object", Arc::new(ObjectProviderType)),
            ("Factory", Arc::new(FactoryProviderType)),
            ("Function", Arc::new(FunctionProviderType)),
        ];
        for (name, provider_type) in provider_types {
            container.insert(
                format!("{PROVIDERS_PREFIX}{name}"),
                BindingTarget::ProviderType(provider_type),
                Vec::new(),
            );
        }

        container
    }

    fn create(parent: Option<Container>, options: ContainerOptions) -> Self {
        let container = Container(Arc::new(ContainerInner {
            bindings: RwLock::new(HashMap::new()),
            parent: parent.clone(),
            teardown: Mutex::new(Vec::new()),
            options,
        }));

        let this = SelfProvider {
            container: container.downgrade(),
        };
        let scope = CloneScope::new(Arc::new(this), ScopeOptions::default());
        container.insert(
            SELF_BINDING.to_string(),
            BindingTarget::Scoped(Arc::new(scope)),
            Vec::new(),
        );

        if let Some(parent) = parent {
            let provider = ObjectProvider::new(PARENT_BINDING, Instance::new(parent));
            let scope = CloneScope::new(Arc::new(provider), ScopeOptions::default());
            container.insert(
                PARENT_BINDING.to_string(),
                BindingTarget::Scoped(Arc::new(scope)),
                Vec::new(),
            );
        }

        container
    }

    /// Creates a container which sees all bindings of this one
    ///
    /// Bindings declared in the child may shadow the ones of its ancestors.
    pub fn create_child(&self) -> Container {
        tracing::debug!("Creating child container");
        Self::create(Some(self.clone()), self.0.options.clone())
    }

    pub fn downgrade(&self) -> WeakContainer {
        WeakContainer(Arc::downgrade(&self.0))
    }

    pub fn parent(&self) -> Option<&Container> {
        self.0.parent.as_ref()
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.0.options
    }

    fn resolver(&self) -> &dyn TargetResolver {
        self.0.options.resolver()
    }

    fn owner(&self) -> Weak<dyn BindingLookup> {
        let owner: Weak<ContainerInner> = Arc::downgrade(&self.0);
        owner
    }

    /// Binding whose dependencies are looked up in this container
    fn binding(&self, name: String, target: BindingTarget, dependencies: Vec<Dependency>) -> Binding {
        Binding::new(name, target, dependencies, self.owner())
    }

    /// Inserts without checking for duplicates, only used for reserved bindings
    fn insert(&self, name: String, target: BindingTarget, dependencies: Vec<Dependency>) {
        let binding = self.binding(name.clone(), target, dependencies);
        self.0.bindings.write().insert(name, Arc::new(binding));
    }

    /// Adds all bindings or none of them
    fn bind_all(&self, entries: Vec<Binding>) -> Result<(), ContainerError> {
        let mut bindings = self.0.bindings.write();

        if let Some(entry) = entries.iter().find(|entry| bindings.contains_key(entry.name())) {
            return Err(ContainerError::DuplicateBinding(entry.name().to_string()));
        }

        for entry in entries {
            tracing::debug!("Binding \"{}\" as {}", entry.name(), entry.target().kind());
            bindings.insert(entry.name().to_string(), Arc::new(entry));
        }

        Ok(())
    }

    fn bind(
        &self,
        name: String,
        target: BindingTarget,
        dependencies: Vec<Dependency>,
    ) -> Result<Bound, ContainerError> {
        let bound = Bound::new(name.as_str(), self.downgrade());
        self.bind_all(vec![self.binding(name, target, dependencies)])?;
        Ok(bound)
    }

    fn provider_type(&self, kind: &str) -> Result<Arc<dyn ProviderType>, ContainerError> {
        let name = format!("{PROVIDERS_PREFIX}{kind}");
        match self.find_binding(&name).map(|binding| binding.target().clone()) {
            Some(BindingTarget::ProviderType(provider_type)) => Ok(provider_type),
            Some(_) => Err(ContainerError::WrongBindingKind {
                name,
                expected: "provider type",
            }),
            None => Err(ContainerError::UnknownProviderType(kind.to_string())),
        }
    }

    fn create_scope(
        &self,
        provider: Arc<dyn Provider>,
        kind: Option<ScopeKind>,
        options: ScopeOptions,
    ) -> Result<Arc<dyn Scope>, ContainerError> {
        let kind = kind.unwrap_or_else(|| self.0.options.default_scope().clone());
        let name = format!("{SCOPES_PREFIX}{kind}");

        match self.find_binding(&name).map(|binding| binding.target().clone()) {
            Some(BindingTarget::ScopeType(scope_type)) => scope_type.create(provider, options),
            Some(_) => Err(ContainerError::WrongBindingKind {
                name,
                expected: "scope type",
            }),
            None => Err(ContainerError::UnknownScope(kind.to_string())),
        }
    }

    fn register_teardown(&self, name: &str, scope: Arc<dyn Scope>) {
        self.0.teardown.lock().push((name.to_string(), scope));
    }
}

// Declarations
impl Container {
    /// Binds a value built by a [Constructor]
    ///
    /// Also binds `@factories/<name>`, so the constructor can be linked
    /// under other names and scopes.
    pub fn bind_instance(
        &self,
        name: &str,
        target: impl Into<TargetRef<Constructor>>,
        dependencies: &[&str],
        options: InstanceOptions,
    ) -> Result<Bound, ContainerError> {
        let constructor = target.into().load(self.resolver())?;
        self.bind_with(name, "Instance", constructor, dependencies, options)
    }

    /// Binds a value built by the provider type registered under `@providers/<kind>`
    pub fn bind_with(
        &self,
        name: &str,
        kind: &str,
        target: impl Into<Target>,
        dependencies: &[&str],
        options: InstanceOptions,
    ) -> Result<Bound, ContainerError> {
        let spec = ProviderSpec {
            name: name.to_string(),
            container: self.downgrade(),
            target: target.into(),
            dependencies: dependencies_of(dependencies),
            initialize: options.initialize.clone(),
            deinitialize: options.deinitialize.clone(),
        };
        let provider = self.provider_type(kind)?.create(spec)?;
        let scope = self.create_scope(provider.clone(), options.scope.clone(), options.scope_options())?;

        let dependencies = provider.dependencies().to_vec();
        self.bind_all(vec![
            self.binding(
                name.to_string(),
                BindingTarget::Scoped(scope.clone()),
                dependencies.clone(),
            ),
            self.binding(
                format!("{FACTORIES_PREFIX}{name}"),
                BindingTarget::Factory(provider),
                dependencies,
            ),
        ])?;

        if options.deinitialize.is_enabled() {
            self.register_teardown(name, scope);
        }

        Ok(Bound::new(name, self.downgrade()))
    }

    /// Binds an existing value, always in the Clone scope
    pub fn bind_object(
        &self,
        name: &str,
        value: Instance,
        options: ObjectOptions,
    ) -> Result<Bound, ContainerError> {
        let spec = ProviderSpec::new(name, self.downgrade(), value);
        let provider = self.provider_type("Object")?.create(spec)?;
        let scope = self.create_scope(provider, Some(ScopeKind::Clone), options.scope_options())?;

        self.bind(name.to_string(), BindingTarget::Scoped(scope), Vec::new())
    }

    /// Binds `@factories/<name>`
    pub fn bind_factory(
        &self,
        name: &str,
        target: impl Into<TargetRef<FactoryFn>>,
        dependencies: &[&str],
    ) -> Result<Bound, ContainerError> {
        let factory = target.into().load(self.resolver())?;
        let spec = ProviderSpec::new(name, self.downgrade(), factory)
            .with_dependencies(dependencies_of(dependencies));
        let provider = self.provider_type("Factory")?.create(spec)?;

        let dependencies = provider.dependencies().to_vec();
        self.bind(
            format!("{FACTORIES_PREFIX}{name}"),
            BindingTarget::Factory(provider),
            dependencies,
        )
    }

    /// Binds a function, [PLACEHOLDER](crate::PLACEHOLDER) dependencies are supplied by its caller
    pub fn bind_function(
        &self,
        name: &str,
        target: impl Into<TargetRef<FunctionFn>>,
        dependencies: &[&str],
        options: FunctionOptions,
    ) -> Result<Bound, ContainerError> {
        let function = target.into().load(self.resolver())?;
        let spec = ProviderSpec::new(name, self.downgrade(), function)
            .with_dependencies(dependencies_of(dependencies));
        let provider = self.provider_type("Function")?.create(spec)?;

        let dependencies = provider.dependencies().to_vec();
        let scope = self.create_scope(provider, options.scope.clone(), options.scope_options())?;
        self.bind(name.to_string(), BindingTarget::Scoped(scope), dependencies)
    }

    /// Binds the values of the factory `@factories/<factory>` under a new name and scope
    ///
    /// The dependencies are still resolved by the container owning the factory,
    /// so the link is validated against that container too.
    pub fn bind_link(
        &self,
        name: &str,
        factory: &str,
        options: LinkOptions,
    ) -> Result<Bound, ContainerError> {
        let factory_name = format!("{FACTORIES_PREFIX}{factory}");
        let Some(binding) = self.find_binding(&factory_name) else {
            return Err(ContainerError::UnboundTarget(factory_name));
        };
        let BindingTarget::Factory(factory) = binding.target().clone() else {
            return Err(ContainerError::WrongBindingKind {
                name: factory_name,
                expected: "factory",
            });
        };

        let dependencies = factory.dependencies().to_vec();
        let provider = LinkProvider::new(name, factory, options.deinitialize.clone());
        let scope = self.create_scope(
            Arc::new(provider),
            options.scope.clone(),
            options.scope_options(),
        )?;
        self.bind_all(vec![Binding::new(
            name,
            BindingTarget::Scoped(scope.clone()),
            dependencies,
            binding.owner(),
        )])?;

        if options.deinitialize.is_enabled() {
            self.register_teardown(name, scope);
        }

        Ok(Bound::new(name, self.downgrade()))
    }

    /// Binds `@providers/<name>`
    pub fn bind_provider_type(
        &self,
        name: &str,
        provider_type: Arc<dyn ProviderType>,
    ) -> Result<Bound, ContainerError> {
        self.bind(
            format!("{PROVIDERS_PREFIX}{name}"),
            BindingTarget::ProviderType(provider_type),
            Vec::new(),
        )
    }

    /// Binds `@scopes/<name>`, selected with [ScopeKind::Custom]
    pub fn bind_scope_type(
        &self,
        name: &str,
        scope_type: Arc<dyn ScopeType>,
    ) -> Result<Bound, ContainerError> {
        self.bind(
            format!("{SCOPES_PREFIX}{name}"),
            BindingTarget::ScopeType(scope_type),
            Vec::new(),
        )
    }
}

// Resolution and lifecycle
impl Container {
    /// Finds a binding here or in one of the ancestors
    pub fn find_binding(&self, name: &str) -> Option<Arc<Binding>> {
        self.0.find_binding(name)
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.find_binding(name).is_some()
    }

    pub async fn resolve(&self, name: &str) -> Result<Instance, ContainerError> {
        tracing::debug!("Resolving \"{name}\"");

        let binding = self
            .find_binding(name)
            .ok_or_else(|| ContainerError::UnboundTarget(name.to_string()))?;
        binding.get().await
    }

    pub async fn resolve_as<T: Injectable>(&self, name: &str) -> Result<Arc<T>, ContainerError> {
        self.resolve(name).await?.downcast()
    }

    /// Resolves the names one after another, results are in the same order
    pub async fn resolve_all(&self, names: &[&str]) -> Result<Vec<Instance>, ContainerError> {
        let mut instances = Vec::with_capacity(names.len());
        for name in names {
            instances.push(self.resolve(name).await?);
        }
        Ok(instances)
    }

    /// Validates every binding declared in this container, in name order
    pub fn validate_all(&self) -> Result<(), ContainerError> {
        let mut bindings: Vec<_> = self.0.bindings.read().values().cloned().collect();
        bindings.sort_by(|a, b| a.name().cmp(b.name()));

        for binding in bindings {
            binding.validate(None)?;
        }

        Ok(())
    }

    /// Deinitializes every binding declared with `deinitialize`, in declaration order
    ///
    /// A failing scope does not stop the others, all failures are returned together.
    pub async fn shutdown(&self) -> Result<(), ContainerError> {
        let scopes = self.0.teardown.lock().clone();
        tracing::debug!("Shutting down {} scope(s)", scopes.len());

        let mut failures = Vec::new();
        for (name, scope) in scopes {
            tracing::debug!("Deinitializing \"{name}\"");
            if let Err(error) = scope.deinitialize().await {
                tracing::warn!("Failed to deinitialize \"{name}\": {error}");
                failures.push(error);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ContainerError::ShutdownFailed { failures })
        }
    }
}

impl Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bindings = self.0.bindings.read();
        let mut names: Vec<_> = bindings.keys().collect();
        names.sort();

        f.debug_struct("Container")
            .field("bindings", &names)
            .field("has_parent", &self.0.parent.is_some())
            .finish()
    }
}

/// Provides `@containers/self`
///
/// Hands out a weak handle, values holding it do not keep their own container alive.
struct SelfProvider {
    container: WeakContainer,
}

impl Provider for SelfProvider {
    fn name(&self) -> &str {
        SELF_BINDING
    }

    fn dependencies(&self) -> &[Dependency] {
        &[]
    }

    fn create(&self) -> BoxFuture<'_, Result<Instance, ContainerError>> {
        let container = Instance::new(self.container.clone());
        async move { Ok(container) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{providers::Lifecycle, types::DynError, ValidationError};

    struct Service;
    impl Lifecycle for Service {}

    fn service() -> Constructor {
        Constructor::new(|_| Ok(Service))
    }

    #[test]
    fn builtins_live_in_the_root_only() {
        let root = Container::new();
        let child = root.create_child();

        assert!(root.find_binding("@scopes/Singleton").is_some());
        assert!(root.find_binding("@providers/Function").is_some());
        assert!(child.0.bindings.read().get("@scopes/Singleton").is_none());
        assert!(child.is_bound("@scopes/Singleton"));

        assert!(root.is_bound(SELF_BINDING));
        assert!(!root.is_bound(PARENT_BINDING));
        assert!(child.0.bindings.read().contains_key(PARENT_BINDING));
    }

    #[test]
    fn names_are_bound_once_per_container() {
        let root = Container::new();
        root.bind_instance("Service", service(), &[], InstanceOptions::new())
            .unwrap();

        assert!(matches!(
            root.bind_instance("Service", service(), &[], InstanceOptions::new()),
            Err(ContainerError::DuplicateBinding(name)) if name == "Service"
        ));
        assert!(matches!(
            root.bind_factory("Service", FactoryFn::new(|_| async { Ok::<_, DynError>(1_u8) }), &[]),
            Err(ContainerError::DuplicateBinding(name)) if name == "@factories/Service"
        ));

        let child = root.create_child();
        assert!(child
            .bind_instance("Service", service(), &[], InstanceOptions::new())
            .is_ok());
    }

    #[test]
    fn instance_bindings_are_registered_atomically() {
        let root = Container::new();
        root.bind_factory("Service", FactoryFn::new(|_| async { Ok::<_, DynError>(1_u8) }), &[])
            .unwrap();

        assert!(root
            .bind_instance("Service", service(), &[], InstanceOptions::new())
            .is_err());
        assert!(!root.is_bound("Service"));
    }

    #[test]
    fn declarations_check_scopes_and_links() {
        let root = Container::new();

        assert!(matches!(
            root.bind_instance("A", service(), &[], InstanceOptions::new().with_scope("Request")),
            Err(ContainerError::UnknownScope(scope)) if scope == "Request"
        ));
        assert!(matches!(
            root.bind_with("B", "Module", service(), &[], InstanceOptions::new()),
            Err(ContainerError::UnknownProviderType(kind)) if kind == "Module"
        ));
        assert!(matches!(
            root.bind_link("C", "Missing", LinkOptions::new()),
            Err(ContainerError::UnboundTarget(name)) if name == "@factories/Missing"
        ));
        assert!(matches!(
            root.bind_with("D", "Object", service(), &[], InstanceOptions::new()),
            Err(ContainerError::InvalidTarget { expected: "value", .. })
        ));
    }

    #[test]
    fn validate_all_reports_the_first_invalid_binding_by_name() {
        let root = Container::new();
        root.bind_instance("B", service(), &["Missing"], InstanceOptions::new())
            .unwrap();
        root.bind_instance("A", service(), &["B"], InstanceOptions::new())
            .unwrap();

        let error = root.validate_all().unwrap_err();
        assert!(matches!(
            error,
            ContainerError::Validation(ValidationError::UnboundDependency { ref requested_by, .. })
                if requested_by == "B"
        ));
    }

    #[tokio::test]
    async fn resolves_itself_and_its_parent() {
        let root = Container::new();
        let child = root.create_child();

        let this = child.resolve_as::<WeakContainer>(SELF_BINDING).await.unwrap();
        let parent = child.resolve_as::<Container>(PARENT_BINDING).await.unwrap();

        assert!(Arc::ptr_eq(&this.upgrade().unwrap().0, &child.0));
        assert!(Arc::ptr_eq(&parent.0, &root.0));
    }

    #[tokio::test]
    async fn unbound_names_fail_to_resolve() {
        let root = Container::new();

        let error = root.resolve("Nothing").await.unwrap_err();
        assert_eq!(error.to_string(), "Unable to resolve unbinded target \"Nothing\"");
    }
}
