// Tue Feb 03 2026 - Alex

use crate::reflection::error::KeyError;
use crate::reflection::match_type::MatchType;
use crate::reflection::member::{MemberDetail, MemberInfo, MemberKind, CONSTRUCTOR_NAME, TYPE_INITIALIZER_NAME};
use crate::reflection::types::TypeHandle;
use crate::reflection::value::Value;
use itertools::Itertools;
use std::fmt;

/// Parameter or indexer shape of a key.
///
/// `Any` matches on name alone. Missing and empty argument or override lists both
/// derive to `Any`, so they compare and hash as the same key. A zero-arity match is
/// built explicitly with [`Signature::none`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Signature {
    Any,
    Exact(Vec<Option<MatchType>>),
}

impl Signature {
    pub fn derive(arguments: Option<&[Value]>, overrides: Option<&[Option<TypeHandle>]>) -> Result<Self, KeyError> {
        let arguments = arguments.unwrap_or(&[]);
        let overrides = overrides.unwrap_or(&[]);
        if arguments.is_empty() && overrides.is_empty() {
            return Ok(Signature::Any);
        }

        let len = arguments.len().max(overrides.len());

        let mut slots = Vec::with_capacity(len);
        for index in 0..len {
            let override_type = overrides.get(index).and_then(|t| t.as_ref());
            slots.push(MatchType::for_argument(index, arguments.get(index), override_type)?);
        }
        Ok(Signature::Exact(slots))
    }

    /// Matches only members that take no parameters.
    pub fn none() -> Self {
        Signature::Exact(Vec::new())
    }

    pub fn from_types(types: &[&TypeHandle]) -> Self {
        Signature::Exact(types.iter().map(|t| Some(MatchType::inheriting(t))).collect())
    }

    /// Whether a declared parameter list satisfies every constraint in order.
    pub fn accepts(&self, parameters: &[TypeHandle]) -> bool {
        match self {
            Signature::Any => true,
            Signature::Exact(slots) => {
                slots.len() == parameters.len()
                    && slots
                        .iter()
                        .zip(parameters)
                        .all(|(slot, param)| slot.as_ref().map_or(true, |m| m.is_assignable_to(param)))
            }
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::Any => write!(f, "(..)"),
            Signature::Exact(slots) => {
                let parts = slots
                    .iter()
                    .map(|s| s.as_ref().map(|m| m.to_string()).unwrap_or_else(|| "_".to_string()))
                    .join(", ");
                write!(f, "({})", parts)
            }
        }
    }
}

/// Variant-specific part of a member key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyShape {
    Method {
        parameters: Signature,
    },
    Constructor {
        is_static_initializer: bool,
        parameters: Signature,
    },
    Property {
        indexers: Signature,
        return_type: Option<MatchType>,
    },
    Field,
    Event,
    NestedType,
    Delegate {
        parameters: Vec<MatchType>,
        return_type: Option<MatchType>,
    },
}

/// Canonical, hashable identity of one member lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberKey {
    reflected_type: TypeHandle,
    member_name: String,
    is_get_operation: bool,
    shape: KeyShape,
}

impl MemberKey {
    fn new(reflected_type: &TypeHandle, member_name: &str, is_get_operation: bool, shape: KeyShape) -> Result<Self, KeyError> {
        if member_name.is_empty() {
            return Err(KeyError::EmptyMemberName);
        }
        Ok(Self {
            reflected_type: reflected_type.clone(),
            member_name: member_name.to_string(),
            is_get_operation,
            shape,
        })
    }

    pub fn method(
        reflected_type: &TypeHandle,
        method_name: &str,
        arguments: Option<&[Value]>,
        overrides: Option<&[Option<TypeHandle>]>,
    ) -> Result<Self, KeyError> {
        let parameters = Signature::derive(arguments, overrides)?;
        Self::method_with(reflected_type, method_name, parameters)
    }

    pub fn method_with(reflected_type: &TypeHandle, method_name: &str, parameters: Signature) -> Result<Self, KeyError> {
        Self::new(reflected_type, method_name, false, KeyShape::Method { parameters })
    }

    pub fn constructor(
        reflected_type: &TypeHandle,
        is_static_initializer: bool,
        arguments: Option<&[Value]>,
        overrides: Option<&[Option<TypeHandle>]>,
    ) -> Result<Self, KeyError> {
        let parameters = Signature::derive(arguments, overrides)?;
        Self::constructor_with(reflected_type, is_static_initializer, parameters)
    }

    pub fn constructor_with(
        reflected_type: &TypeHandle,
        is_static_initializer: bool,
        parameters: Signature,
    ) -> Result<Self, KeyError> {
        let name = if is_static_initializer {
            TYPE_INITIALIZER_NAME
        } else {
            CONSTRUCTOR_NAME
        };
        Self::new(
            reflected_type,
            name,
            false,
            KeyShape::Constructor {
                is_static_initializer,
                parameters,
            },
        )
    }

    pub fn property(
        reflected_type: &TypeHandle,
        property_name: &str,
        is_get_operation: bool,
        return_type: Option<&TypeHandle>,
        indexer_arguments: Option<&[Value]>,
        overrides: Option<&[Option<TypeHandle>]>,
    ) -> Result<Self, KeyError> {
        let indexers = Signature::derive(indexer_arguments, overrides)?;
        Self::property_with(reflected_type, property_name, is_get_operation, return_type, indexers)
    }

    pub fn property_with(
        reflected_type: &TypeHandle,
        property_name: &str,
        is_get_operation: bool,
        return_type: Option<&TypeHandle>,
        indexers: Signature,
    ) -> Result<Self, KeyError> {
        Self::new(
            reflected_type,
            property_name,
            is_get_operation,
            KeyShape::Property {
                indexers,
                return_type: return_type.map(MatchType::inheriting),
            },
        )
    }

    pub fn field(reflected_type: &TypeHandle, field_name: &str, is_get_operation: bool) -> Result<Self, KeyError> {
        Self::new(reflected_type, field_name, is_get_operation, KeyShape::Field)
    }

    pub fn event(reflected_type: &TypeHandle, event_name: &str) -> Result<Self, KeyError> {
        Self::new(reflected_type, event_name, true, KeyShape::Event)
    }

    pub fn nested_type(reflected_type: &TypeHandle, type_name: &str) -> Result<Self, KeyError> {
        Self::new(reflected_type, type_name, true, KeyShape::NestedType)
    }

    /// Key for a method that can serve as a handler with the given shape.
    pub fn delegate(
        reflected_type: &TypeHandle,
        member_name: &str,
        argument_types: &[TypeHandle],
        return_type: Option<&TypeHandle>,
    ) -> Result<Self, KeyError> {
        Self::new(
            reflected_type,
            member_name,
            false,
            KeyShape::Delegate {
                parameters: argument_types.iter().map(MatchType::inheriting).collect(),
                return_type: return_type.map(MatchType::inheriting),
            },
        )
    }

    pub fn reflected_type(&self) -> &TypeHandle {
        &self.reflected_type
    }

    pub fn member_name(&self) -> &str {
        &self.member_name
    }

    pub fn is_get_operation(&self) -> bool {
        self.is_get_operation
    }

    pub fn shape(&self) -> &KeyShape {
        &self.shape
    }

    pub fn kind(&self) -> MemberKind {
        match self.shape {
            KeyShape::Method { .. } | KeyShape::Delegate { .. } => MemberKind::Method,
            KeyShape::Constructor { .. } => MemberKind::Constructor,
            KeyShape::Property { .. } => MemberKind::Property,
            KeyShape::Field => MemberKind::Field,
            KeyShape::Event => MemberKind::Event,
            KeyShape::NestedType => MemberKind::NestedType,
        }
    }

    /// Copy of this key one level closer to the root. The original is left as is.
    pub fn step_down_in_type_hierarchy(&self) -> Result<MemberKey, KeyError> {
        let base = self
            .reflected_type
            .base_type()
            .ok_or_else(|| KeyError::NoBaseType(self.reflected_type.name().to_string()))?;

        let mut key = self.clone();
        key.reflected_type = base.clone();
        Ok(key)
    }

    /// Whether a declared member satisfies name, kind and shape of this key.
    pub fn matches(&self, member: &MemberInfo) -> bool {
        if member.name() != self.member_name || member.kind() != self.kind() {
            return false;
        }

        match (&self.shape, member.detail()) {
            (KeyShape::Method { parameters }, MemberDetail::Method { parameters: declared, .. }) => {
                parameters.accepts(declared)
            }
            (
                KeyShape::Constructor {
                    is_static_initializer,
                    parameters,
                },
                MemberDetail::Constructor {
                    parameters: declared,
                    is_static_initializer: declared_static,
                    ..
                },
            ) => is_static_initializer == declared_static && parameters.accepts(declared),
            (
                KeyShape::Property { indexers, return_type },
                MemberDetail::Property {
                    property_type,
                    indexers: declared,
                    ..
                },
            ) => {
                let return_ok = match return_type {
                    None => true,
                    Some(m) if self.is_get_operation => m.is_assignable_from(property_type),
                    Some(m) => m.is_assignable_to(property_type),
                };
                return_ok && indexers.accepts(declared)
            }
            (
                KeyShape::Delegate { parameters, return_type },
                MemberDetail::Method {
                    parameters: declared,
                    return_type: declared_return,
                    ..
                },
            ) => {
                let params_ok = parameters.len() == declared.len()
                    && parameters.iter().zip(declared).all(|(m, p)| m.is_assignable_to(p));
                let return_ok = match (return_type, declared_return) {
                    (None, None) => true,
                    (Some(m), Some(r)) => m.is_assignable_from(r),
                    _ => false,
                };
                params_ok && return_ok
            }
            (KeyShape::Field, MemberDetail::Field { .. })
            | (KeyShape::Event, MemberDetail::Event { .. })
            | (KeyShape::NestedType, MemberDetail::NestedType { .. }) => true,
            _ => false,
        }
    }
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.reflected_type, self.member_name)?;
        match &self.shape {
            KeyShape::Method { parameters } | KeyShape::Constructor { parameters, .. } => write!(f, "{}", parameters),
            KeyShape::Property { indexers, .. } => write!(f, "[{}]", indexers),
            KeyShape::Delegate { parameters, .. } => write!(f, "({})", parameters.iter().join(", ")),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::types::{builtin, TypeBuilder};
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(key: &MemberKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_identical_keys_are_equal_and_hash_alike() {
        let ty = TypeBuilder::class("Target").build();
        let first = MemberKey::method(&ty, "Run", Some(&[Value::Int(1), Value::from("a")]), None).unwrap();
        let second = MemberKey::method(&ty, "Run", Some(&[Value::Int(9), Value::from("b")]), None).unwrap();
        assert_eq!(first, second);
        assert_eq!(hash_of(&first), hash_of(&second));
    }

    #[test]
    fn test_override_keys_match_regardless_of_argument() {
        let types = builtin();
        let ty = TypeBuilder::class("Target").build();
        let overrides = [Some(types.comparable.clone())];
        let with_argument = MemberKey::method(&ty, "f", Some(&[Value::Int(1)]), Some(&overrides)).unwrap();
        let without_argument = MemberKey::method(&ty, "f", None, Some(&overrides)).unwrap();
        assert_eq!(with_argument, without_argument);
        assert_eq!(hash_of(&with_argument), hash_of(&without_argument));
    }

    #[test]
    fn test_parameter_order_matters() {
        let ty = TypeBuilder::class("Target").build();
        let int_string = MemberKey::method(&ty, "f", Some(&[Value::Int(1), Value::from("a")]), None).unwrap();
        let string_int = MemberKey::method(&ty, "f", Some(&[Value::from("a"), Value::Int(1)]), None).unwrap();
        assert_ne!(int_string, string_int);
    }

    #[test]
    fn test_variant_and_flags_are_part_of_identity() {
        let ty = TypeBuilder::class("Target").build();
        let getter = MemberKey::field(&ty, "hp", true).unwrap();
        let setter = MemberKey::field(&ty, "hp", false).unwrap();
        let event = MemberKey::event(&ty, "hp").unwrap();
        assert_ne!(getter, setter);
        assert_ne!(getter, event);

        let missing = MemberKey::method(&ty, "f", None, None).unwrap();
        let empty_args = MemberKey::method(&ty, "f", Some(&[]), None).unwrap();
        let empty_overrides = MemberKey::method(&ty, "f", None, Some(&[])).unwrap();
        assert_eq!(missing.shape(), &KeyShape::Method { parameters: Signature::Any });
        assert_eq!(missing, empty_args);
        assert_eq!(missing, empty_overrides);
        assert_eq!(hash_of(&missing), hash_of(&empty_args));
        assert_eq!(hash_of(&missing), hash_of(&empty_overrides));

        let zero_arity = MemberKey::method_with(&ty, "f", Signature::none()).unwrap();
        assert_eq!(Signature::none(), Signature::from_types(&[]));
        assert_ne!(missing, zero_arity);
    }

    #[test]
    fn test_empty_indexers_match_missing_indexers() {
        let ty = TypeBuilder::class("Target").build();
        let missing = MemberKey::property(&ty, "Size", true, None, None, None).unwrap();
        let empty = MemberKey::property(&ty, "Size", true, None, Some(&[]), Some(&[])).unwrap();
        assert_eq!(missing, empty);
        assert_eq!(hash_of(&missing), hash_of(&empty));
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let ty = TypeBuilder::class("Target").build();
        assert_eq!(MemberKey::method(&ty, "", None, None), Err(KeyError::EmptyMemberName));
        assert_eq!(MemberKey::field(&ty, "", true), Err(KeyError::EmptyMemberName));
    }

    #[test]
    fn test_override_contradiction_is_rejected() {
        let types = builtin();
        let ty = TypeBuilder::class("Target").build();
        let overrides = [Some(types.int.clone())];
        let result = MemberKey::method(&ty, "f", Some(&[Value::from("no")]), Some(&overrides));
        assert!(matches!(result, Err(KeyError::OverrideMismatch { index: 0, .. })));
    }

    #[test]
    fn test_step_down_terminates_at_root() {
        let a = TypeBuilder::class("A").build();
        let b = TypeBuilder::class("B").base(&a).build();
        let c = TypeBuilder::class("C").base(&b).build();
        let d = TypeBuilder::class("D").base(&c).build();

        let original = MemberKey::method(&d, "Describe", None, None).unwrap();
        let mut key = original.clone();
        for _ in 0..d.depth() {
            key = key.step_down_in_type_hierarchy().unwrap();
        }

        assert_eq!(key.reflected_type(), &builtin().object);
        assert!(key.reflected_type().base_type().is_none());
        assert_eq!(key.step_down_in_type_hierarchy(), Err(KeyError::NoBaseType("object".to_string())));
        assert_eq!(original.reflected_type(), &d);
        assert_eq!(key.member_name(), original.member_name());
    }

    #[test]
    fn test_constructor_keys_use_fixed_names() {
        let ty = TypeBuilder::class("Target").build();
        let ctor = MemberKey::constructor(&ty, false, Some(&[]), None).unwrap();
        let cctor = MemberKey::constructor(&ty, true, None, None).unwrap();
        assert_eq!(ctor.member_name(), CONSTRUCTOR_NAME);
        assert_eq!(cctor.member_name(), TYPE_INITIALIZER_NAME);
    }

    #[test]
    fn test_signature_accepts_placeholders() {
        let types = builtin();
        let signature = Signature::derive(Some(&[Value::Null, Value::Int(3)]), None).unwrap();
        assert!(signature.accepts(&[types.string.clone(), types.int.clone()]));
        assert!(!signature.accepts(&[types.string.clone()]));
        assert_eq!(signature.to_string(), "(_, int)");
    }
}
