// Wed Feb 04 2026 - Alex

use crate::reflection::cache::MemberCache;
use crate::reflection::error::{AccessError, ResolveError};
use crate::reflection::key::{MemberKey, Signature};
use crate::reflection::member::{MemberDetail, MemberHandle, MemberKind};
use crate::reflection::types::TypeHandle;
use crate::reflection::value::{ObjectRef, Value};
use log::trace;

/// An event paired with the method that handles it.
#[derive(Debug, Clone)]
pub struct EventBinding {
    pub event: MemberHandle,
    pub handler: MemberHandle,
}

impl EventBinding {
    /// Invokes the handler with the event arguments. `target` is ignored for static handlers.
    pub fn raise(&self, target: Option<&Value>, args: &[Value]) -> Result<Value, AccessError> {
        let target = if self.handler.is_static() { None } else { target };
        Ok(self.handler.invoke(target, args)?)
    }
}

/// Calls, reads and writes members by name, public or not.
///
/// Lookups walk from the given type toward the root one level at a time and stop at
/// the first level that resolves. Ambiguity at any level ends the walk with an error.
/// The resolved declaration is invoked as-is, whatever the runtime type of the instance.
pub struct Accessor<'c> {
    cache: &'c MemberCache,
}

impl Accessor<'static> {
    pub fn global() -> Self {
        Self::new(MemberCache::global())
    }
}

impl<'c> Accessor<'c> {
    pub fn new(cache: &'c MemberCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &MemberCache {
        self.cache
    }

    fn find(&self, key: MemberKey) -> Result<(MemberHandle, TypeHandle), AccessError> {
        let origin = key.reflected_type().name().to_string();
        let mut key = key;

        loop {
            let resolution = self.cache.lookup(&key);
            if let Some(member) = resolution.into_result(&key)? {
                return Ok((member, key.reflected_type().clone()));
            }

            match key.step_down_in_type_hierarchy() {
                Ok(next) => {
                    trace!("{} not on {}, stepping down", key.member_name(), key.reflected_type());
                    key = next;
                }
                Err(_) => {
                    return Err(ResolveError::Missing {
                        type_name: origin,
                        member: key.member_name().to_string(),
                    }
                    .into())
                }
            }
        }
    }

    fn find_here(&self, key: MemberKey) -> Result<MemberHandle, AccessError> {
        let resolution = self.cache.lookup(&key);
        resolution.into_result(&key)?.ok_or_else(|| {
            ResolveError::Missing {
                type_name: key.reflected_type().name().to_string(),
                member: key.member_name().to_string(),
            }
            .into()
        })
    }

    fn check_instance<'v>(
        member: &MemberHandle,
        owner: &TypeHandle,
        instance: Option<&'v Value>,
    ) -> Result<Option<&'v Value>, AccessError> {
        if member.is_static() {
            return Ok(None);
        }

        let value = instance
            .filter(|v| !v.is_null())
            .ok_or_else(|| AccessError::InstanceRequired(member.name().to_string()))?;

        match value.runtime_type() {
            Some(actual) if owner.is_assignable_from(&actual) => Ok(Some(value)),
            actual => Err(AccessError::InstanceTypeMismatch {
                expected: owner.name().to_string(),
                actual: actual.map(|t| t.name().to_string()).unwrap_or_else(|| "null".to_string()),
            }),
        }
    }

    fn check_value(member: &MemberHandle, value: &Value) -> Result<(), AccessError> {
        let Some(expected) = member.value_type() else {
            return Ok(());
        };

        let fits = match value.runtime_type() {
            None => expected.is_nullable(),
            Some(actual) => expected.is_assignable_from(&actual),
        };

        if fits {
            Ok(())
        } else {
            Err(AccessError::ValueTypeMismatch {
                member: member.name().to_string(),
                expected: expected.name().to_string(),
                actual: value.type_name(),
            })
        }
    }

    /// Signature for an actual call. Calling with nothing targets the zero-arity
    /// overload rather than any member of that name.
    fn call_signature(args: &[Value], overrides: Option<&[Option<TypeHandle>]>) -> Result<Signature, AccessError> {
        if args.is_empty() && overrides.map_or(true, |o| o.is_empty()) {
            return Ok(Signature::none());
        }
        Ok(Signature::derive(Some(args), overrides)?)
    }

    fn object_of<'v>(member: &MemberHandle, instance: Option<&'v Value>) -> Result<&'v ObjectRef, AccessError> {
        let value = instance.ok_or_else(|| AccessError::InstanceRequired(member.name().to_string()))?;
        value.as_object().ok_or_else(|| AccessError::InstanceTypeMismatch {
            expected: member.declaring_type().to_string(),
            actual: value.type_name(),
        })
    }

    pub fn call_method(
        &self,
        ty: &TypeHandle,
        instance: Option<&Value>,
        name: &str,
        args: &[Value],
        overrides: Option<&[Option<TypeHandle>]>,
    ) -> Result<Value, AccessError> {
        let key = MemberKey::method_with(ty, name, Self::call_signature(args, overrides)?)?;
        let (member, owner) = self.find(key)?;
        let instance = Self::check_instance(&member, &owner, instance)?;
        Ok(member.invoke(instance, args)?)
    }

    /// Allocates an instance and runs the matching constructor. Constructors are not
    /// inherited, so only `ty` itself is searched. A type that declares no constructor
    /// at all can still be created without arguments.
    pub fn create_instance(
        &self,
        ty: &TypeHandle,
        args: &[Value],
        overrides: Option<&[Option<TypeHandle>]>,
    ) -> Result<Value, AccessError> {
        let instance = Value::Object(ObjectRef::new(ty));

        let declares_constructor = ty
            .declared_members()
            .iter()
            .any(|m| m.kind() == MemberKind::Constructor && !m.is_static_initializer());
        if !declares_constructor && args.is_empty() {
            return Ok(instance);
        }

        let key = MemberKey::constructor_with(ty, false, Self::call_signature(args, overrides)?)?;
        let constructor = self.find_here(key)?;
        constructor.invoke(Some(&instance), args)?;
        Ok(instance)
    }

    pub fn run_static_initializer(&self, ty: &TypeHandle) -> Result<(), AccessError> {
        let key = MemberKey::constructor(ty, true, None, None)?;
        let initializer = self.find_here(key)?;
        initializer.invoke(None, &[])?;
        Ok(())
    }

    pub fn get_field(&self, ty: &TypeHandle, instance: Option<&Value>, name: &str) -> Result<Value, AccessError> {
        let key = MemberKey::field(ty, name, true)?;
        let (member, owner) = self.find(key)?;

        if member.is_static() {
            return Ok(owner.static_value(name).unwrap_or_default());
        }

        let instance = Self::check_instance(&member, &owner, instance)?;
        let object = Self::object_of(&member, instance)?;
        Ok(object
            .get_field(&owner, name)
            .or_else(|| member.value_type().map(|t| t.default_value()))
            .unwrap_or_default())
    }

    pub fn set_field(&self, ty: &TypeHandle, instance: Option<&Value>, name: &str, value: Value) -> Result<(), AccessError> {
        let key = MemberKey::field(ty, name, false)?;
        let (member, owner) = self.find(key)?;
        Self::check_value(&member, &value)?;

        if member.is_static() {
            owner.set_static_value(name, value);
            return Ok(());
        }

        let instance = Self::check_instance(&member, &owner, instance)?;
        Self::object_of(&member, instance)?.set_field(&owner, name, value);
        Ok(())
    }

    pub fn get_property(
        &self,
        ty: &TypeHandle,
        instance: Option<&Value>,
        name: &str,
        indexers: &[Value],
    ) -> Result<Value, AccessError> {
        let key = MemberKey::property_with(ty, name, true, None, Self::call_signature(indexers, None)?)?;
        let (member, owner) = self.find(key)?;
        let instance = Self::check_instance(&member, &owner, instance)?;

        match member.detail() {
            MemberDetail::Property { getter: Some(getter), .. } => Ok(getter(instance, indexers)?),
            _ => Err(AccessError::WriteOnly(member.name().to_string())),
        }
    }

    /// The setter receives the indexer values followed by the new value.
    pub fn set_property(
        &self,
        ty: &TypeHandle,
        instance: Option<&Value>,
        name: &str,
        indexers: &[Value],
        value: Value,
    ) -> Result<(), AccessError> {
        let value_type = value.runtime_type();
        let key = MemberKey::property_with(ty, name, false, value_type.as_ref(), Self::call_signature(indexers, None)?)?;
        let (member, owner) = self.find(key)?;
        Self::check_value(&member, &value)?;
        let instance = Self::check_instance(&member, &owner, instance)?;

        match member.detail() {
            MemberDetail::Property { setter: Some(setter), .. } => {
                let mut args = indexers.to_vec();
                args.push(value);
                setter(instance, &args)?;
                Ok(())
            }
            _ => Err(AccessError::ReadOnly(member.name().to_string())),
        }
    }

    /// Nested types belong to their declaring type only and are not searched for in bases.
    pub fn nested_type(&self, ty: &TypeHandle, name: &str) -> Result<TypeHandle, AccessError> {
        let key = MemberKey::nested_type(ty, name)?;
        let member = self.find_here(key)?;
        match member.detail() {
            MemberDetail::NestedType { nested } => Ok(nested.clone()),
            _ => Err(ResolveError::Missing {
                type_name: ty.name().to_string(),
                member: name.to_string(),
            }
            .into()),
        }
    }

    /// Finds `event` on `owner` and a method named `handler_name` on `handler_type`
    /// whose shape fits the event's handler signature.
    pub fn bind_event_handler(
        &self,
        owner: &TypeHandle,
        event: &str,
        handler_type: &TypeHandle,
        handler_name: &str,
    ) -> Result<EventBinding, AccessError> {
        let (event_member, _) = self.find(MemberKey::event(owner, event)?)?;
        let key = MemberKey::delegate(
            handler_type,
            handler_name,
            event_member.parameters(),
            event_member.return_type(),
        )?;
        let (handler, _) = self.find(key)?;

        Ok(EventBinding {
            event: event_member,
            handler,
        })
    }
}
