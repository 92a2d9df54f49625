use std::sync::Arc;

use thiserror::Error;

use crate::{binding::Binding, state::State, types::Dependency};

/// Read access to the bindings visible from a container
///
/// The validator only ever looks bindings up through this trait.
pub trait BindingLookup: Send + Sync {
    /// Finds a binding by name, searching parent containers if needed
    fn find_binding(&self, name: &str) -> Option<Arc<Binding>>;
}

/// Walks the dependencies of a binding depth first
/// and checks that every dependency is bound and that no cycles exist
pub struct Validator<'a> {
    lookup: &'a dyn BindingLookup,
}

impl<'a> Validator<'a> {
    pub fn new(lookup: &'a dyn BindingLookup) -> Self {
        Validator { lookup }
    }

    /// Validates the given dependencies of the binding on top of `state`
    ///
    /// Every dependency is checked on its own fork of `state`.
    pub fn validate(&self, dependencies: &[Dependency], state: &State) -> Result<(), ValidationError> {
        for dependency in dependencies {
            // Placeholders are filled by the caller and never looked up
            let Some(name) = dependency.name() else {
                continue;
            };

            self.check_dependency(name, state.fork())?;
        }

        Ok(())
    }

    fn check_dependency(&self, name: &str, mut state: State) -> Result<(), ValidationError> {
        let Some(binding) = self.lookup.find_binding(name) else {
            return Err(ValidationError::UnboundDependency {
                dependency: name.to_string(),
                requested_by: state.top().to_string(),
            });
        };

        if state.has(name) {
            return Err(ValidationError::CyclicDependency {
                target: state.target().to_string(),
                path: state.path(name),
            });
        }

        state.push(name);
        binding.validate(Some(state))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unable to resolve unbound dependency \"{dependency}\" as requested by \"{requested_by}\".")]
    UnboundDependency {
        dependency: String,
        requested_by: String,
    },
    #[error("Detected a cycle while trying to resolve dependencies for \"{target}\". The path was \"{path}\".")]
    CyclicDependency { target: String, path: String },
    /// The container owning a binding was dropped mid validation
    #[error("The container owning \"{0}\" was dropped")]
    ContainerDropped(String),
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Weak,
        },
    };

    use super::*;
    use crate::{
        binding::BindingTarget,
        providers::object::ObjectProvider,
        types::{dependencies_of, Instance},
    };

    /// Lookup which counts how often it was asked for a binding
    struct CountingLookup {
        bindings: HashMap<String, Arc<Binding>>,
        lookups: AtomicUsize,
    }

    impl BindingLookup for CountingLookup {
        fn find_binding(&self, name: &str) -> Option<Arc<Binding>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.bindings.get(name).cloned()
        }
    }

    fn graph(edges: &[(&str, &[&str])]) -> Arc<CountingLookup> {
        Arc::new_cyclic(|weak: &Weak<CountingLookup>| {
            let owner: Weak<dyn BindingLookup> = weak.clone();
            let bindings = edges
                .iter()
                .map(|(name, dependencies)| {
                    let provider = Arc::new(ObjectProvider::new(*name, Instance::new(())));
                    let binding = Binding::new(
                        *name,
                        BindingTarget::Factory(provider),
                        dependencies_of(dependencies),
                        owner.clone(),
                    );
                    (name.to_string(), Arc::new(binding))
                })
                .collect();

            CountingLookup {
                bindings,
                lookups: AtomicUsize::new(0),
            }
        })
    }

    fn validate(lookup: &CountingLookup, name: &str) -> Result<(), ValidationError> {
        lookup.bindings[name].validate(None)
    }

    #[test]
    fn accepts_a_diamond() {
        let lookup = graph(&[
            ("A", &["B", "C"]),
            ("B", &["D"]),
            ("C", &["D"]),
            ("D", &[]),
        ]);

        assert_eq!(validate(&lookup, "A"), Ok(()));
        assert!(lookup.bindings["D"].is_validated());
    }

    #[test]
    fn validates_each_binding_once() {
        let lookup = graph(&[
            ("A", &["B", "C"]),
            ("B", &["D"]),
            ("C", &["D"]),
            ("D", &[]),
        ]);

        validate(&lookup, "A").unwrap();
        let after_first = lookup.lookups.load(Ordering::SeqCst);
        assert_eq!(after_first, 4);

        validate(&lookup, "A").unwrap();
        validate(&lookup, "B").unwrap();
        assert_eq!(lookup.lookups.load(Ordering::SeqCst), after_first);
    }

    #[test]
    fn invalidated_bindings_are_walked_again() {
        let lookup = graph(&[("A", &["B"]), ("B", &[])]);

        validate(&lookup, "A").unwrap();
        assert_eq!(lookup.lookups.load(Ordering::SeqCst), 1);

        lookup.bindings["A"].invalidate();
        assert!(!lookup.bindings["A"].is_validated());
        assert!(lookup.bindings["B"].is_validated());

        validate(&lookup, "A").unwrap();
        assert_eq!(lookup.lookups.load(Ordering::SeqCst), 2);
        assert!(lookup.bindings["A"].is_validated());
    }

    #[test]
    fn reports_unbound_dependencies() {
        let lookup = graph(&[("A", &["B"]), ("B", &["Missing"])]);

        assert_eq!(
            validate(&lookup, "A"),
            Err(ValidationError::UnboundDependency {
                dependency: "Missing".into(),
                requested_by: "B".into(),
            })
        );
        assert!(!lookup.bindings["A"].is_validated());
    }

    #[test]
    fn reports_cycles_with_their_path() {
        let lookup = graph(&[("A", &["B"]), ("B", &["C"]), ("C", &["A"])]);

        let error = validate(&lookup, "A").unwrap_err();

        assert_eq!(
            error,
            ValidationError::CyclicDependency {
                target: "A".into(),
                path: "A ⇄ B ⇄ C ⇄ A".into(),
            }
        );
        assert_eq!(
            error.to_string(),
            "Detected a cycle while trying to resolve dependencies for \"A\". The path was \"A ⇄ B ⇄ C ⇄ A\"."
        );
    }

    #[test]
    fn skips_placeholders() {
        let lookup = graph(&[("F", &["A", crate::types::PLACEHOLDER]), ("A", &[])]);

        assert_eq!(validate(&lookup, "F"), Ok(()));
        assert_eq!(lookup.lookups.load(Ordering::SeqCst), 1);
    }
}
