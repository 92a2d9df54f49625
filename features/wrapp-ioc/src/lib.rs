//! Named-binding inversion of control container
//!
//! Values are declared under a name together with the names they depend on,
//! and resolved later with all dependencies wired in.
//!
//! ```ignore
//! let container = Container::new();
//! container.bind_instance("Config", Constructor::new(|_| Ok(Config::default())), &[], InstanceOptions::new())?;
//! container.bind_instance(
//!     "Client",
//!     Constructor::new(|args| Ok(Client::new(args.get::<Config>(0)?))),
//!     &["Config"],
//!     InstanceOptions::new().with_initialize(true),
//! )?;
//!
//! let client = container.resolve_as::<Client>("Client").await?;
//! ```
//!
//! How often a value is created is decided by its scope (Singleton, Prototype, Clone),
//! how it is created by its provider (Instance, Object, Factory, Function).
//! Both are looked up by name, so custom scopes and providers can be registered
//! under `@scopes/<name>` and `@providers/<name>`.

mod binding;
mod container;
mod errors;
mod options;
pub mod providers;
pub mod scopes;
mod state;
mod target;
mod types;
mod validator;

pub use binding::{Binding, BindingTarget, Bound};
pub use container::{
    Container, WeakContainer, FACTORIES_PREFIX, PARENT_BINDING, PROVIDERS_PREFIX, SCOPES_PREFIX,
    SELF_BINDING,
};
pub use errors::ContainerError;
pub use options::{ContainerOptions, FunctionOptions, InstanceOptions, LinkOptions, ObjectOptions};
pub use providers::{
    BoundFunction, Factory, Hook, HookFuture, Lifecycle, Provider, ProviderSpec, ProviderType,
};
pub use scopes::{CloneFn, CloneMode, Scope, ScopeKind, ScopeOptions, ScopeType, Setup};
pub use state::State;
pub use target::{
    CachingResolver, CatalogResolver, Constructor, FactoryFn, FunctionFn, LoadError, Target,
    TargetKind, TargetRef, TargetResolver,
};
pub use types::{Args, Dependency, DynError, Injectable, Instance, PLACEHOLDER};
pub use validator::{BindingLookup, ValidationError, Validator};
