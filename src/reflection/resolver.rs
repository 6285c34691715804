// Tue Feb 03 2026 - Alex

use crate::reflection::error::ResolveError;
use crate::reflection::key::MemberKey;
use crate::reflection::member::MemberHandle;
use log::trace;

/// Outcome of looking a key up on a single hierarchy level.
#[derive(Debug, Clone)]
pub enum Resolution {
    Found(MemberHandle),
    Ambiguous(Vec<MemberHandle>),
    NotFound,
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    pub fn found(self) -> Option<MemberHandle> {
        match self {
            Resolution::Found(member) => Some(member),
            _ => None,
        }
    }

    /// Converts an ambiguous outcome into the matching error. `Found` and `NotFound` pass through.
    pub fn into_result(self, key: &MemberKey) -> Result<Option<MemberHandle>, ResolveError> {
        match self {
            Resolution::Found(member) => Ok(Some(member)),
            Resolution::NotFound => Ok(None),
            Resolution::Ambiguous(candidates) => Err(ResolveError::Ambiguous {
                type_name: key.reflected_type().name().to_string(),
                member: key.member_name().to_string(),
                candidates: candidates.iter().map(|m| m.signature()).collect(),
            }),
        }
    }
}

/// Finds the members declared on `key.reflected_type()` that satisfy the key.
/// Base types are never consulted; more than one match is reported as ambiguous.
pub fn resolve(key: &MemberKey) -> Resolution {
    let mut candidates: Vec<MemberHandle> = key
        .reflected_type()
        .declared_members_named(key.member_name())
        .filter(|member| key.matches(member))
        .cloned()
        .collect();

    trace!("Resolving {} matched {} candidate(s)", key, candidates.len());

    match candidates.len() {
        0 => Resolution::NotFound,
        1 => Resolution::Found(candidates.remove(0)),
        _ => Resolution::Ambiguous(candidates),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::key::Signature;
    use crate::reflection::types::{builtin, TypeBuilder};
    use crate::reflection::value::Value;

    #[test]
    fn test_single_match_is_found() {
        let types = builtin();
        let ty = TypeBuilder::class("Calc")
            .method("Add", &[&types.int, &types.int], Some(&types.int), |_, _| Ok(Value::Null))
            .method("Add", &[&types.double, &types.double], Some(&types.double), |_, _| Ok(Value::Null))
            .build();

        let key = MemberKey::method(&ty, "Add", Some(&[Value::Int(1), Value::Int(2)]), None).unwrap();
        let member = resolve(&key).found().unwrap();
        assert_eq!(member.signature(), "Add(int, int) -> int");
    }

    #[test]
    fn test_interface_overloads_are_ambiguous() {
        let types = builtin();
        let ty = TypeBuilder::class("Target")
            .method("f", &[&types.comparable], None, |_, _| Ok(Value::from("comparable")))
            .method("f", &[&types.convertible], None, |_, _| Ok(Value::from("convertible")))
            .build();

        let key = MemberKey::method(&ty, "f", Some(&[Value::Int(5)]), None).unwrap();
        let err = resolve(&key).into_result(&key).unwrap_err();
        match err {
            ResolveError::Ambiguous { candidates, .. } => assert_eq!(candidates.len(), 2),
            other => panic!("unexpected {:?}", other),
        }

        let overrides = [Some(types.comparable.clone())];
        let key = MemberKey::method(&ty, "f", Some(&[Value::Int(5)]), Some(&overrides)).unwrap();
        let member = resolve(&key).found().unwrap();
        assert_eq!(member.invoke(None, &[Value::Int(5)]), Ok(Value::from("comparable")));
    }

    #[test]
    fn test_any_signature_with_overloads_is_ambiguous() {
        let types = builtin();
        let ty = TypeBuilder::class("Target")
            .method("g", &[], None, |_, _| Ok(Value::Null))
            .method("g", &[&types.int], None, |_, _| Ok(Value::Null))
            .build();

        let any = MemberKey::method(&ty, "g", None, None).unwrap();
        assert!(matches!(resolve(&any), Resolution::Ambiguous(_)));

        let empty = MemberKey::method(&ty, "g", Some(&[]), None).unwrap();
        assert_eq!(empty, any);
        assert!(matches!(resolve(&empty), Resolution::Ambiguous(_)));

        let none = MemberKey::method_with(&ty, "g", Signature::none()).unwrap();
        assert!(resolve(&none).is_found());
    }

    #[test]
    fn test_inherited_members_are_not_seen() {
        let types = builtin();
        let base = TypeBuilder::class("Base").field("hp", &types.int).build();
        let derived = TypeBuilder::class("Derived").base(&base).build();

        let key = MemberKey::field(&derived, "hp", true).unwrap();
        assert!(matches!(resolve(&key), Resolution::NotFound));
        assert!(resolve(&key.step_down_in_type_hierarchy().unwrap()).is_found());
    }

    #[test]
    fn test_property_return_type_filters() {
        let types = builtin();
        let ty = TypeBuilder::class("Holder")
            .member(crate::reflection::member::MemberInfo::property("Name", &types.string, &[], None, None))
            .build();

        let good = MemberKey::property(&ty, "Name", true, Some(&types.convertible), None, None).unwrap();
        let bad = MemberKey::property(&ty, "Name", true, Some(&types.int), None, None).unwrap();
        assert!(resolve(&good).is_found());
        assert!(matches!(resolve(&bad), Resolution::NotFound));
    }
}
