use std::{
    any::{type_name, Any},
    fmt::{Debug, Display},
    sync::Arc,
};

use crate::errors::ContainerError;

/// Boxed error returned by user supplied constructors, factories and hooks
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// We assume that we are using a multithreaded async runtime
/// So anything injectable needs to be Send + Sync + 'static
pub trait Injectable: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Injectable for T {}

type AnyValue = dyn Any + Send + Sync + 'static;
type DeepCopy = fn(&AnyValue) -> Option<Instance>;

/// A resolved value
///
/// Instances are shared: cloning an [Instance] clones the handle, not the value.
/// Use [Instance::ptr_eq] to check whether two resolutions produced the same value.
#[derive(Clone)]
pub struct Instance {
    type_name: &'static str,
    value: Arc<AnyValue>,
    deep_copy: Option<DeepCopy>,
}

impl Instance {
    pub fn new<T: Injectable>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps an already shared value
    pub fn from_arc<T: Injectable>(value: Arc<T>) -> Self {
        Instance {
            type_name: type_name::<T>(),
            value,
            deep_copy: None,
        }
    }

    /// Creates an instance which can be deep copied by a Clone scope
    pub fn cloneable<T: Injectable + Clone>(value: T) -> Self {
        Instance {
            deep_copy: Some(copy_value::<T>),
            ..Self::new(value)
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Injectable>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast<T: Injectable>(&self) -> Result<Arc<T>, ContainerError> {
        Arc::downcast::<T>(self.value.clone()).map_err(|_| ContainerError::DowncastFailed {
            required_type: type_name::<T>(),
            actual_type: self.type_name,
        })
    }

    /// Returns a deep copy, if the value was registered as cloneable
    pub fn deep_copy(&self) -> Option<Instance> {
        self.deep_copy.and_then(|copy| copy(self.value.as_ref()))
    }

    /// True if both handles point to the very same value
    pub fn ptr_eq(this: &Instance, other: &Instance) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&this.value), Arc::as_ptr(&other.value))
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Instance").field(&self.type_name).finish()
    }
}

fn copy_value<T: Injectable + Clone>(value: &AnyValue) -> Option<Instance> {
    value
        .downcast_ref::<T>()
        .map(|value| Instance::cloneable(value.clone()))
}

/// Marks a dependency slot which is filled by the caller of a bound function
pub const PLACEHOLDER: &str = "<ARG_PLACEHOLDER>";

/// A declared dependency of a binding
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dependency {
    /// Resolved from the container by name
    Named(String),
    /// Supplied by the caller at invocation time
    Placeholder,
}

impl Dependency {
    /// Name of the binding to resolve, None for placeholders
    pub fn name(&self) -> Option<&str> {
        match self {
            Dependency::Named(name) => Some(name),
            Dependency::Placeholder => None,
        }
    }
}

impl From<&str> for Dependency {
    fn from(name: &str) -> Self {
        if name == PLACEHOLDER {
            Dependency::Placeholder
        } else {
            Dependency::Named(name.to_string())
        }
    }
}

impl Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dependency::Named(name) => f.write_str(name),
            Dependency::Placeholder => f.write_str(PLACEHOLDER),
        }
    }
}

pub(crate) fn dependencies_of(names: &[&str]) -> Vec<Dependency> {
    names.iter().map(|name| Dependency::from(*name)).collect()
}

/// Positional arguments handed to constructors, factories and functions
///
/// A slot is empty when it belongs to a placeholder the caller did not fill.
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: Vec<Option<Instance>>,
}

impl Args {
    pub fn new(values: Vec<Option<Instance>>) -> Self {
        Args { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn instance(&self, index: usize) -> Option<&Instance> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Typed access to a required argument
    pub fn get<T: Injectable>(&self, index: usize) -> Result<Arc<T>, ContainerError> {
        self.instance(index)
            .ok_or(ContainerError::MissingArgument(index))?
            .downcast()
    }

    /// Typed access to an argument which may have been left out
    pub fn get_opt<T: Injectable>(&self, index: usize) -> Result<Option<Arc<T>>, ContainerError> {
        self.instance(index).map(Instance::downcast::<T>).transpose()
    }

    pub fn into_inner(self) -> Vec<Option<Instance>> {
        self.values
    }
}

impl FromIterator<Instance> for Args {
    fn from_iter<I: IntoIterator<Item = Instance>>(iter: I) -> Self {
        Args::new(iter.into_iter().map(Some).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Settings {
        key: u32,
    }

    #[test]
    fn downcast_checks_the_type() {
        let instance = Instance::new(42_u32);

        assert_eq!(*instance.downcast::<u32>().unwrap(), 42);
        assert!(matches!(
            instance.downcast::<String>(),
            Err(ContainerError::DowncastFailed {
                actual_type: "u32",
                ..
            })
        ));
    }

    #[test]
    fn clones_share_the_value_but_deep_copies_do_not() {
        let instance = Instance::cloneable(Settings { key: 42 });
        let shared = instance.clone();
        let copy = instance.deep_copy().unwrap();

        assert!(Instance::ptr_eq(&instance, &shared));
        assert!(!Instance::ptr_eq(&instance, &copy));
        assert_eq!(
            *copy.downcast::<Settings>().unwrap(),
            Settings { key: 42 }
        );
    }

    #[test]
    fn plain_instances_cannot_be_deep_copied() {
        assert!(Instance::new(Settings { key: 1 }).deep_copy().is_none());
    }

    #[test]
    fn placeholder_marker_becomes_a_placeholder() {
        let dependencies = dependencies_of(&["Param1", PLACEHOLDER]);

        assert_eq!(
            dependencies,
            vec![Dependency::Named("Param1".into()), Dependency::Placeholder]
        );
        assert_eq!(dependencies[1].name(), None);
    }

    #[test]
    fn args_report_missing_slots() {
        let args = Args::new(vec![Some(Instance::new(1_u8)), None]);

        assert_eq!(*args.get::<u8>(0).unwrap(), 1);
        assert!(args.get_opt::<u8>(1).unwrap().is_none());
        assert!(matches!(
            args.get::<u8>(1),
            Err(ContainerError::MissingArgument(1))
        ));
        assert!(matches!(
            args.get::<u8>(7),
            Err(ContainerError::MissingArgument(7))
        ));
    }
}
