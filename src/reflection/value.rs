// Mon Feb 02 2026 - Alex

use crate::reflection::member::MemberKind;
use crate::reflection::types::{builtin, TypeHandle};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Dynamic value passed through the reflective accessor.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Object(ObjectRef),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Runtime type of the value, `None` for null.
    pub fn runtime_type(&self) -> Option<TypeHandle> {
        let types = builtin();
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(types.boolean.clone()),
            Value::Int(_) => Some(types.int.clone()),
            Value::Float(_) => Some(types.double.clone()),
            Value::Str(_) => Some(types.string.clone()),
            Value::Object(obj) => Some(obj.type_handle().clone()),
        }
    }

    pub fn type_name(&self) -> String {
        self.runtime_type()
            .map(|t| t.name().to_string())
            .unwrap_or_else(|| "null".to_string())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", s),
            Value::Object(obj) => write!(f, "<{}>", obj.type_handle()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

struct ObjectData {
    ty: TypeHandle,
    fields: RwLock<IndexMap<(u64, String), Value>>,
}

/// Shared instance of a reflected type.
#[derive(Clone)]
pub struct ObjectRef(Arc<ObjectData>);

impl ObjectRef {
    /// Allocates an instance with every instance field along the hierarchy set to its default.
    /// Slots are keyed by declaring type, so a field shadowed in a subclass keeps its own storage.
    pub fn new(ty: &TypeHandle) -> Self {
        let mut fields = IndexMap::new();
        for level in ty.ancestry() {
            for member in level.declared_members() {
                if member.kind() != MemberKind::Field || member.is_static() {
                    continue;
                }
                let default = member.value_type().map(|t| t.default_value()).unwrap_or(Value::Null);
                fields.insert((level.id(), member.name().to_string()), default);
            }
        }

        Self(Arc::new(ObjectData {
            ty: ty.clone(),
            fields: RwLock::new(fields),
        }))
    }

    pub fn type_handle(&self) -> &TypeHandle {
        &self.0.ty
    }

    pub fn get_field(&self, owner: &TypeHandle, name: &str) -> Option<Value> {
        self.0.fields.read().get(&(owner.id(), name.to_string())).cloned()
    }

    pub fn set_field(&self, owner: &TypeHandle, name: &str, value: Value) {
        self.0.fields.write().insert((owner.id(), name.to_string()), value);
    }

    /// Field names in storage order, most derived first. Shadowed names appear once per level.
    pub fn field_names(&self) -> Vec<String> {
        self.0.fields.read().keys().map(|(_, name)| name.clone()).collect()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("type", &self.0.ty.name())
            .field("fields", &*self.0.fields.read())
            .finish()
    }
}
