use std::sync::Arc;

use thiserror::Error;

use crate::{target::LoadError, types::DynError, validator::ValidationError};

/// Errors raised while declaring, resolving or tearing down bindings
///
/// Errors are cloneable so a single failed singleton construction
/// can be reported to every caller waiting on it.
#[derive(Error, Debug, Clone)]
pub enum ContainerError {
    /// The name is already bound in this container
    #[error("There's already a bind called \"{0}\"")]
    DuplicateBinding(String),
    /// No provider type is registered under `@providers/<kind>`
    #[error("Unknown bind kind \"{0}\"")]
    UnknownProviderType(String),
    /// No scope type is registered under `@scopes/<kind>`
    #[error("Unknown scope \"{0}\"")]
    UnknownScope(String),
    /// Nothing is bound under the requested name
    #[error("Unable to resolve unbinded target \"{0}\"")]
    UnboundTarget(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A lifecycle hook was configured but the instance does not provide it
    #[error("Unable to find a lifecycle method called \"{method}\" on an instance of \"{binding}\"")]
    MissingLifecycleMethod { binding: String, method: String },
    #[error("Invalid setup option for \"{binding}\": expected '{expected}' got '{actual}'")]
    InvalidSetupOption {
        binding: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("Invalid clone option for \"{binding}\": {reason}")]
    InvalidCloneOption { binding: String, reason: String },
    #[error(transparent)]
    TargetLoad(#[from] LoadError),
    /// The target handed to a provider type is of the wrong kind
    #[error("Provider for \"{binding}\" needs a {expected} target but got a {actual}")]
    InvalidTarget {
        binding: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A constructor, factory or function returned an error
    #[error("Construction of \"{binding}\" failed - error: {error}")]
    ConstructionFailed {
        binding: String,
        error: Arc<DynError>,
    },
    #[error("The {hook} hook of \"{binding}\" failed - error: {error}")]
    HookFailed {
        binding: String,
        hook: String,
        error: Arc<DynError>,
    },
    #[error("Call to \"{function}\" failed - error: {error}")]
    CallFailed {
        function: String,
        error: Arc<DynError>,
    },
    #[error("Failed to downcast, required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        required_type: &'static str,
        actual_type: &'static str,
    },
    #[error("No argument at position {0}")]
    MissingArgument(usize),
    #[error("\"{name}\" is not a {expected} binding")]
    WrongBindingKind { name: String, expected: &'static str },

    /// The future driving a singleton construction was dropped before it finished
    #[error("Construction of \"{0}\" was aborted")]
    ConstructionAborted(String),
    #[error("The container owning \"{0}\" was dropped")]
    ContainerDropped(String),
    #[error("Shutdown finished with {} failure(s)", .failures.len())]
    ShutdownFailed { failures: Vec<ContainerError> },
}

impl ContainerError {
    pub(crate) fn hook_failed(binding: &str, hook: &str, error: DynError) -> Self {
        ContainerError::HookFailed {
            binding: binding.to_string(),
            hook: hook.to_string(),
            error: Arc::new(error),
        }
    }
}
