use std::{
    any::type_name,
    collections::HashMap,
    fmt::Debug,
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::{future::BoxFuture, FutureExt};
use parking_lot::Mutex;
use thiserror::Error;

use crate::{
    providers::Lifecycle,
    types::{Args, DynError, Injectable, Instance},
};

type ConstructCall = dyn Fn(Args) -> Result<Instance, DynError> + Send + Sync;
type HookCall = dyn Fn(Instance, String) -> BoxFuture<'static, Option<Result<(), DynError>>> + Send + Sync;
type AsyncCall = dyn Fn(Args) -> BoxFuture<'static, Result<Instance, DynError>> + Send + Sync;

/// Builds an instance from its resolved dependencies
///
/// Remembers the constructed type so lifecycle hooks can be looked up later.
#[derive(Clone)]
pub struct Constructor {
    type_name: &'static str,
    construct: Arc<ConstructCall>,
    hooks: Arc<HookCall>,
}

impl Constructor {
    pub fn new<T, F>(construct: F) -> Self
    where
        T: Lifecycle,
        F: Fn(Args) -> Result<T, DynError> + Send + Sync + 'static,
    {
        Constructor {
            type_name: type_name::<T>(),
            construct: Arc::new(move |args| construct(args).map(Instance::new)),
            hooks: Arc::new(call_hook::<T>),
        }
    }

    /// Like [Constructor::new] but the instances can be deep copied by a Clone scope
    pub fn cloneable<T, F>(construct: F) -> Self
    where
        T: Lifecycle + Clone,
        F: Fn(Args) -> Result<T, DynError> + Send + Sync + 'static,
    {
        Constructor {
            type_name: type_name::<T>(),
            construct: Arc::new(move |args| construct(args).map(Instance::cloneable)),
            hooks: Arc::new(call_hook::<T>),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn construct(&self, args: Args) -> Result<Instance, DynError> {
        (self.construct)(args)
    }

    /// Runs the named lifecycle hook of an instance built by this constructor
    ///
    /// Returns None if the instance has no such hook.
    pub(crate) fn call_hook(
        &self,
        instance: Instance,
        name: &str,
    ) -> BoxFuture<'static, Option<Result<(), DynError>>> {
        (self.hooks)(instance, name.to_string())
    }
}

fn call_hook<T: Lifecycle>(
    instance: Instance,
    name: String,
) -> BoxFuture<'static, Option<Result<(), DynError>>> {
    async move {
        let value = instance.downcast::<T>().ok()?;
        let hook = value.lifecycle_hook(&name)?;
        Some(hook.await)
    }
    .boxed()
}

impl Debug for Constructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Constructor").field(&self.type_name).finish()
    }
}

fn erase_async<T, F, Fut>(call: F) -> Arc<AsyncCall>
where
    T: Injectable,
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, DynError>> + Send + 'static,
{
    Arc::new(move |args| call(args).map(|result| result.map(Instance::new)).boxed())
}

fn erase_raw<F, Fut>(call: F) -> Arc<AsyncCall>
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Instance, DynError>> + Send + 'static,
{
    Arc::new(move |args| call(args).boxed())
}

/// Async factory producing a new value every time it is called
#[derive(Clone)]
pub struct FactoryFn {
    call: Arc<AsyncCall>,
    hooks: Option<Arc<HookCall>>,
}

impl FactoryFn {
    pub fn new<T, F, Fut>(factory: F) -> Self
    where
        T: Injectable,
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, DynError>> + Send + 'static,
    {
        FactoryFn {
            call: erase_async(factory),
            hooks: None,
        }
    }

    /// Like [FactoryFn::new] but links to the factory can run the [Lifecycle] hooks of its values
    pub fn with_lifecycle<T, F, Fut>(factory: F) -> Self
    where
        T: Lifecycle,
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, DynError>> + Send + 'static,
    {
        FactoryFn {
            call: erase_async(factory),
            hooks: Some(Arc::new(call_hook::<T>)),
        }
    }

    /// Factory returning prepared instances, e.g. [Instance::cloneable] ones
    pub fn raw<F, Fut>(factory: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Instance, DynError>> + Send + 'static,
    {
        FactoryFn {
            call: erase_raw(factory),
            hooks: None,
        }
    }

    pub(crate) fn call(&self, args: Args) -> BoxFuture<'static, Result<Instance, DynError>> {
        (self.call)(args)
    }

    /// Runs the named lifecycle hook, None without [FactoryFn::with_lifecycle]
    pub(crate) fn call_hook(
        &self,
        instance: Instance,
        name: &str,
    ) -> BoxFuture<'static, Option<Result<(), DynError>>> {
        match &self.hooks {
            Some(hooks) => hooks(instance, name.to_string()),
            None => async { None }.boxed(),
        }
    }
}

impl Debug for FactoryFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryFn")
            .field("lifecycle", &self.hooks.is_some())
            .finish()
    }
}

/// Async function whose arguments are partly injected and partly passed by the caller
#[derive(Clone)]
pub struct FunctionFn {
    call: Arc<AsyncCall>,
}

impl FunctionFn {
    pub fn new<T, F, Fut>(function: F) -> Self
    where
        T: Injectable,
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, DynError>> + Send + 'static,
    {
        FunctionFn {
            call: erase_async(function),
        }
    }

    pub fn raw<F, Fut>(function: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Instance, DynError>> + Send + 'static,
    {
        FunctionFn {
            call: erase_raw(function),
        }
    }

    pub(crate) fn call(&self, args: Args) -> BoxFuture<'static, Result<Instance, DynError>> {
        (self.call)(args)
    }
}

impl Debug for FunctionFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FunctionFn")
    }
}

/// Anything a provider can be built from
#[derive(Clone, Debug)]
pub enum Target {
    Constructor(Constructor),
    Factory(FactoryFn),
    Function(FunctionFn),
    Value(Instance),
}

impl Target {
    pub fn kind(&self) -> &'static str {
        match self {
            Target::Constructor(_) => Constructor::KIND,
            Target::Factory(_) => FactoryFn::KIND,
            Target::Function(_) => FunctionFn::KIND,
            Target::Value(_) => Instance::KIND,
        }
    }
}

impl From<Constructor> for Target {
    fn from(constructor: Constructor) -> Self {
        Target::Constructor(constructor)
    }
}

impl From<FactoryFn> for Target {
    fn from(factory: FactoryFn) -> Self {
        Target::Factory(factory)
    }
}

impl From<FunctionFn> for Target {
    fn from(function: FunctionFn) -> Self {
        Target::Function(function)
    }
}

impl From<Instance> for Target {
    fn from(value: Instance) -> Self {
        Target::Value(value)
    }
}

/// Typed view on one [Target] variant
pub trait TargetKind: Sized {
    const KIND: &'static str;

    fn from_target(target: Target) -> Option<Self>;
}

impl TargetKind for Constructor {
    const KIND: &'static str = "constructor";

    fn from_target(target: Target) -> Option<Self> {
        match target {
            Target::Constructor(constructor) => Some(constructor),
            _ => None,
        }
    }
}

impl TargetKind for FactoryFn {
    const KIND: &'static str = "factory";

    fn from_target(target: Target) -> Option<Self> {
        match target {
            Target::Factory(factory) => Some(factory),
            _ => None,
        }
    }
}

impl TargetKind for FunctionFn {
    const KIND: &'static str = "function";

    fn from_target(target: Target) -> Option<Self> {
        match target {
            Target::Function(function) => Some(function),
            _ => None,
        }
    }
}

impl TargetKind for Instance {
    const KIND: &'static str = "value";

    fn from_target(target: Target) -> Option<Self> {
        match target {
            Target::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// A target given either directly or as a path for the [TargetResolver]
#[derive(Debug, Clone)]
pub enum TargetRef<T> {
    Direct(T),
    Path(String),
}

impl<T: TargetKind> TargetRef<T> {
    pub fn load(self, resolver: &dyn TargetResolver) -> Result<T, LoadError> {
        let path = match self {
            TargetRef::Direct(target) => return Ok(target),
            TargetRef::Path(path) => path,
        };

        let target = resolver.resolve(&path)?;
        let actual = target.kind();
        T::from_target(target).ok_or(LoadError::KindMismatch {
            path,
            expected: T::KIND,
            actual,
        })
    }
}

impl<T> From<&str> for TargetRef<T> {
    fn from(path: &str) -> Self {
        TargetRef::Path(path.to_string())
    }
}

impl<T> From<String> for TargetRef<T> {
    fn from(path: String) -> Self {
        TargetRef::Path(path)
    }
}

impl From<Constructor> for TargetRef<Constructor> {
    fn from(constructor: Constructor) -> Self {
        TargetRef::Direct(constructor)
    }
}

impl From<FactoryFn> for TargetRef<FactoryFn> {
    fn from(factory: FactoryFn) -> Self {
        TargetRef::Direct(factory)
    }
}

impl From<FunctionFn> for TargetRef<FunctionFn> {
    fn from(function: FunctionFn) -> Self {
        TargetRef::Direct(function)
    }
}

/// Turns target paths into targets
pub trait TargetResolver: Send + Sync {
    fn resolve(&self, path: &str) -> Result<Target, LoadError>;
}

/// In-process catalog of targets keyed by path
///
/// Absolute paths are looked up as given, relative ones are joined onto the root.
#[derive(Debug, Clone, Default)]
pub struct CatalogResolver {
    root: Option<PathBuf>,
    targets: HashMap<PathBuf, Target>,
}

impl CatalogResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Registers a target under its full path
    pub fn register(mut self, path: impl Into<PathBuf>, target: impl Into<Target>) -> Self {
        self.targets.insert(path.into(), target.into());
        self
    }

    fn full_path(&self, path: &str) -> Result<PathBuf, LoadError> {
        let path = Path::new(path);
        if path.is_absolute() {
            tracing::debug!("Resolving \"{}\" as an absolute path", path.display());
            return Ok(path.to_path_buf());
        }

        tracing::debug!("Resolving \"{}\" as a relative path", path.display());
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| LoadError::MissingRoot(path.display().to_string()))?;
        Ok(root.join(path))
    }
}

impl TargetResolver for CatalogResolver {
    fn resolve(&self, path: &str) -> Result<Target, LoadError> {
        let full_path = self.full_path(path)?;
        self.targets
            .get(&full_path)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(full_path.display().to_string()))
    }
}

/// Resolves every path only once and keeps the result
///
/// Failed lookups are not cached.
pub struct CachingResolver<R> {
    resolver: R,
    cache: Mutex<HashMap<String, Target>>,
}

impl<R: TargetResolver> CachingResolver<R> {
    pub fn new(resolver: R) -> Self {
        CachingResolver {
            resolver,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

impl<R: TargetResolver> TargetResolver for CachingResolver<R> {
    fn resolve(&self, path: &str) -> Result<Target, LoadError> {
        if let Some(target) = self.cache.lock().get(path) {
            tracing::debug!("Resolved \"{path}\" from cache");
            return Ok(target.clone());
        }

        let target = self.resolver.resolve(path)?;
        self.cache.lock().insert(path.to_string(), target.clone());
        Ok(target)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("A relative path \"{0}\" given but no root is specified")]
    MissingRoot(String),
    #[error("Unable to load \"{0}\": no target registered under that path")]
    NotFound(String),
    #[error("Target \"{path}\" is a {actual} but a {expected} is required")]
    KindMismatch {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },
}
