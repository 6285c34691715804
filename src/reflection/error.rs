// Mon Feb 02 2026 - Alex

use thiserror::Error;

/// Raised while building a member key. These are caller mistakes and are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Member name must not be empty")]
    EmptyMemberName,
    #[error("Argument {index} of type '{actual}' is not assignable to override type '{expected}'")]
    OverrideMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
    #[error("Argument {index} is null but override type '{expected}' is not nullable")]
    NullIntoValueType { index: usize, expected: String },
    #[error("Type '{0}' has no base type")]
    NoBaseType(String),
}

/// Raised when a well-formed key does not identify exactly one member.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Ambiguous match for '{member}' on '{type_name}': {}", candidates.join(", "))]
    Ambiguous {
        type_name: String,
        member: String,
        candidates: Vec<String>,
    },
    #[error("Member '{member}' not found on '{type_name}' or any of its base types")]
    Missing { type_name: String, member: String },
}

/// Raised by the member bodies themselves.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    #[error("Expected {expected} arguments, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Custom(String),
}

/// Error surfaced by the reflective accessor. `Argument` is a mistake in the call,
/// `Resolution` means the member could not be found, `Invocation` comes from the member.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Invalid call: {0}")]
    Argument(#[from] KeyError),
    #[error("Could not resolve member: {0}")]
    Resolution(#[from] ResolveError),
    #[error("Invocation failed: {0}")]
    Invocation(#[from] InvokeError),
    #[error("Member '{0}' is not static and needs an instance")]
    InstanceRequired(String),
    #[error("Instance of type '{actual}' is not a '{expected}'")]
    InstanceTypeMismatch { expected: String, actual: String },
    #[error("Value of type '{actual}' cannot be stored in '{member}' of type '{expected}'")]
    ValueTypeMismatch {
        member: String,
        expected: String,
        actual: String,
    },
    #[error("Member '{0}' is read-only")]
    ReadOnly(String),
    #[error("Member '{0}' is write-only")]
    WriteOnly(String),
}

impl AccessError {
    /// True when the caller passed something wrong, as opposed to a lookup failure.
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            AccessError::Argument(_)
                | AccessError::InstanceRequired(_)
                | AccessError::InstanceTypeMismatch { .. }
                | AccessError::ValueTypeMismatch { .. }
        )
    }

    pub fn is_resolution_error(&self) -> bool {
        matches!(self, AccessError::Resolution(_))
    }
}
