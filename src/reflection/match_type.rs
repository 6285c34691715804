// Mon Feb 02 2026 - Alex

use crate::reflection::error::KeyError;
use crate::reflection::types::TypeHandle;
use crate::reflection::value::Value;
use std::fmt;

/// One parameter, indexer or return type constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchType {
    ty: TypeHandle,
    allow_inheritance: bool,
}

impl MatchType {
    pub fn new(ty: &TypeHandle, allow_inheritance: bool) -> Self {
        Self {
            ty: ty.clone(),
            allow_inheritance,
        }
    }

    pub fn exact(ty: &TypeHandle) -> Self {
        Self::new(ty, false)
    }

    pub fn inheriting(ty: &TypeHandle) -> Self {
        Self::new(ty, true)
    }

    pub fn ty(&self) -> &TypeHandle {
        &self.ty
    }

    pub fn allow_inheritance(&self) -> bool {
        self.allow_inheritance
    }

    /// Whether a value described by this constraint can flow into a slot of `target`.
    pub fn is_assignable_to(&self, target: &TypeHandle) -> bool {
        self.ty == *target || (self.allow_inheritance && target.is_assignable_from(&self.ty))
    }

    /// Whether a value of type `source` satisfies this constraint.
    pub fn is_assignable_from(&self, source: &TypeHandle) -> bool {
        self.ty == *source || (self.allow_inheritance && self.ty.is_assignable_from(source))
    }

    /// Derives the constraint for one argument position.
    ///
    /// An override wins and demands an exact match; it is checked against the concrete
    /// argument when one is present. Without an override the argument's runtime type is
    /// used with inheritance allowed. With neither there is no constraint.
    pub fn for_argument(
        index: usize,
        argument: Option<&Value>,
        override_type: Option<&TypeHandle>,
    ) -> Result<Option<MatchType>, KeyError> {
        match (override_type, argument) {
            (Some(expected), Some(value)) => {
                match value.runtime_type() {
                    None if !expected.is_nullable() => {
                        return Err(KeyError::NullIntoValueType {
                            index,
                            expected: expected.name().to_string(),
                        });
                    }
                    Some(actual) if !expected.is_assignable_from(&actual) => {
                        return Err(KeyError::OverrideMismatch {
                            index,
                            expected: expected.name().to_string(),
                            actual: actual.name().to_string(),
                        });
                    }
                    _ => {}
                }
                Ok(Some(MatchType::exact(expected)))
            }
            (Some(expected), None) => Ok(Some(MatchType::exact(expected))),
            (None, Some(value)) => Ok(value.runtime_type().map(|t| MatchType::inheriting(&t))),
            (None, None) => Ok(None),
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.allow_inheritance {
            write!(f, "{}", self.ty)
        } else {
            write!(f, "={}", self.ty)
        }
    }
}
