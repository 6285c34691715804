// Mon Feb 02 2026 - Alex

use crate::reflection::error::InvokeError;
use crate::reflection::member::{MemberFlags, MemberHandle, MemberInfo, MemberKind};
use crate::reflection::value::Value;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    ValueType,
    Interface,
}

/// Immutable description of one reflected type.
pub struct TypeDescriptor {
    id: u64,
    name: String,
    kind: TypeKind,
    base: Option<TypeHandle>,
    interfaces: Vec<TypeHandle>,
    members: Vec<MemberHandle>,
    statics: RwLock<IndexMap<String, Value>>,
}

/// Shared handle to a type descriptor. Identity is the process-unique type id.
#[derive(Clone)]
pub struct TypeHandle(Arc<TypeDescriptor>);

impl TypeHandle {
    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn kind(&self) -> TypeKind {
        self.0.kind
    }

    pub fn base_type(&self) -> Option<&TypeHandle> {
        self.0.base.as_ref()
    }

    pub fn interfaces(&self) -> &[TypeHandle] {
        &self.0.interfaces
    }

    /// Members declared directly on this type. Inherited members are not included.
    pub fn declared_members(&self) -> &[MemberHandle] {
        &self.0.members
    }

    pub fn declared_members_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MemberHandle> + 'a {
        self.0.members.iter().filter(move |m| m.name() == name)
    }

    pub fn is_interface(&self) -> bool {
        self.0.kind == TypeKind::Interface
    }

    pub fn is_nullable(&self) -> bool {
        self.0.kind != TypeKind::ValueType
    }

    /// This type followed by each base type up to the root.
    pub fn ancestry(&self) -> Ancestry {
        Ancestry { next: Some(self.clone()) }
    }

    /// Number of base-type steps from this type to the root.
    pub fn depth(&self) -> usize {
        self.ancestry().count() - 1
    }

    pub fn is_subclass_of(&self, other: &TypeHandle) -> bool {
        self.ancestry().skip(1).any(|t| t == *other)
    }

    pub fn implements(&self, interface: &TypeHandle) -> bool {
        self.ancestry().any(|t| {
            t.interfaces()
                .iter()
                .any(|i| i == interface || i.implements(interface))
        })
    }

    /// Whether a value of type `source` can be stored in a slot of this type.
    pub fn is_assignable_from(&self, source: &TypeHandle) -> bool {
        if self == source {
            return true;
        }
        if *self == builtin().object {
            return true;
        }
        if self.is_interface() {
            return source.implements(self);
        }
        source.is_subclass_of(self)
    }

    pub fn default_value(&self) -> Value {
        let b = builtin();
        if *self == b.int {
            Value::Int(0)
        } else if *self == b.double {
            Value::Float(0.0)
        } else if *self == b.boolean {
            Value::Bool(false)
        } else {
            Value::Null
        }
    }

    pub fn static_value(&self, name: &str) -> Option<Value> {
        self.0.statics.read().get(name).cloned()
    }

    pub fn set_static_value(&self, name: &str, value: Value) {
        self.0.statics.write().insert(name.to_string(), value);
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({}#{})", self.0.name, self.0.id)
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

pub struct Ancestry {
    next: Option<TypeHandle>,
}

impl Iterator for Ancestry {
    type Item = TypeHandle;

    fn next(&mut self) -> Option<TypeHandle> {
        let current = self.next.take()?;
        self.next = current.base_type().cloned();
        Some(current)
    }
}

/// Types every value in the object model can have at runtime.
pub struct BuiltinTypes {
    pub object: TypeHandle,
    pub comparable: TypeHandle,
    pub convertible: TypeHandle,
    pub boolean: TypeHandle,
    pub int: TypeHandle,
    pub double: TypeHandle,
    pub string: TypeHandle,
}

static BUILTINS: Lazy<BuiltinTypes> = Lazy::new(|| {
    let object = TypeBuilder::root("object")
        .method("ToString", &[], None, |this, _| {
            Ok(Value::Str(this.map(|v| v.type_name()).unwrap_or_else(|| "object".to_string())))
        })
        .build();
    let comparable = TypeBuilder::interface("IComparable").build();
    let convertible = TypeBuilder::interface("IConvertible").build();

    let primitive = |name: &str, kind: TypeKind| {
        TypeBuilder::with_base(name, kind, Some(object.clone()))
            .implements(&comparable)
            .implements(&convertible)
            .build()
    };

    BuiltinTypes {
        boolean: primitive("bool", TypeKind::ValueType),
        int: primitive("int", TypeKind::ValueType),
        double: primitive("double", TypeKind::ValueType),
        string: primitive("string", TypeKind::Class),
        object,
        comparable,
        convertible,
    }
});

pub fn builtin() -> &'static BuiltinTypes {
    &BUILTINS
}

/// Declares a type and its members. Classes and value types derive from `object`
/// unless another base is given.
pub struct TypeBuilder {
    name: String,
    kind: TypeKind,
    base: Option<TypeHandle>,
    interfaces: Vec<TypeHandle>,
    members: Vec<MemberInfo>,
    statics: IndexMap<String, Value>,
}

impl TypeBuilder {
    fn with_base(name: &str, kind: TypeKind, base: Option<TypeHandle>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            base,
            interfaces: Vec::new(),
            members: Vec::new(),
            statics: IndexMap::new(),
        }
    }

    fn root(name: &str) -> Self {
        Self::with_base(name, TypeKind::Class, None)
    }

    pub fn class(name: &str) -> Self {
        Self::with_base(name, TypeKind::Class, Some(builtin().object.clone()))
    }

    pub fn value_type(name: &str) -> Self {
        Self::with_base(name, TypeKind::ValueType, Some(builtin().object.clone()))
    }

    pub fn interface(name: &str) -> Self {
        Self::with_base(name, TypeKind::Interface, None)
    }

    pub fn base(mut self, base: &TypeHandle) -> Self {
        if self.kind != TypeKind::Interface {
            self.base = Some(base.clone());
        }
        self
    }

    pub fn implements(mut self, interface: &TypeHandle) -> Self {
        if !self.interfaces.contains(interface) {
            self.interfaces.push(interface.clone());
        }
        self
    }

    pub fn member(mut self, member: MemberInfo) -> Self {
        self.members.push(member);
        self
    }

    pub fn method<F>(self, name: &str, parameters: &[&TypeHandle], return_type: Option<&TypeHandle>, body: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.member(MemberInfo::method(name, parameters, return_type, body))
    }

    pub fn static_method<F>(self, name: &str, parameters: &[&TypeHandle], return_type: Option<&TypeHandle>, body: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.member(
            MemberInfo::method(name, parameters, return_type, body)
                .with_flags(MemberFlags::PUBLIC | MemberFlags::STATIC),
        )
    }

    pub fn constructor<F>(self, parameters: &[&TypeHandle], body: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.member(MemberInfo::constructor(parameters, body))
    }

    pub fn static_initializer<F>(self, body: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.member(MemberInfo::static_initializer(body))
    }

    pub fn field(self, name: &str, field_type: &TypeHandle) -> Self {
        self.member(MemberInfo::field(name, field_type))
    }

    pub fn private_field(self, name: &str, field_type: &TypeHandle) -> Self {
        self.member(MemberInfo::field(name, field_type).with_flags(MemberFlags::NON_PUBLIC))
    }

    pub fn static_field(mut self, name: &str, field_type: &TypeHandle, initial: Value) -> Self {
        self.statics.insert(name.to_string(), initial);
        self.member(
            MemberInfo::field(name, field_type).with_flags(MemberFlags::PUBLIC | MemberFlags::STATIC),
        )
    }

    pub fn event(self, name: &str, handler_parameters: &[&TypeHandle], handler_return: Option<&TypeHandle>) -> Self {
        self.member(MemberInfo::event(name, handler_parameters, handler_return))
    }

    pub fn nested_type(self, nested: &TypeHandle) -> Self {
        self.member(MemberInfo::nested_type(nested))
    }

    pub fn build(self) -> TypeHandle {
        let id = NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed);
        let mut statics = self.statics;
        let members = self
            .members
            .into_iter()
            .map(|mut member| {
                member.set_declaring_type(&self.name);
                if member.kind() == MemberKind::Field && member.is_static() && !statics.contains_key(member.name()) {
                    let initial = member.value_type().map(|t| t.default_value()).unwrap_or(Value::Null);
                    statics.insert(member.name().to_string(), initial);
                }
                Arc::new(member)
            })
            .collect();

        TypeHandle(Arc::new(TypeDescriptor {
            id,
            name: self.name,
            kind: self.kind,
            base: self.base,
            interfaces: self.interfaces,
            members,
            statics: RwLock::new(statics),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> (TypeHandle, TypeHandle, TypeHandle) {
        let a = TypeBuilder::class("A").build();
        let b = TypeBuilder::class("B").base(&a).build();
        let c = TypeBuilder::class("C").base(&b).build();
        (a, b, c)
    }

    #[test]
    fn test_type_identity_is_per_build() {
        let first = TypeBuilder::class("Same").build();
        let second = TypeBuilder::class("Same").build();
        assert_ne!(first, second);
        assert_eq!(first, first.clone());
    }

    #[test]
    fn test_ancestry_ends_at_object() {
        let (_, _, c) = chain();
        let names: Vec<String> = c.ancestry().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["C", "B", "A", "object"]);
        assert_eq!(c.depth(), 3);
        assert!(builtin().object.base_type().is_none());
    }

    #[test]
    fn test_assignability() {
        let (a, b, c) = chain();
        assert!(a.is_assignable_from(&c));
        assert!(b.is_assignable_from(&c));
        assert!(!c.is_assignable_from(&a));
        assert!(builtin().object.is_assignable_from(&c));

        let types = builtin();
        assert!(types.comparable.is_assignable_from(&types.int));
        assert!(types.convertible.is_assignable_from(&types.string));
        assert!(!types.comparable.is_assignable_from(&a));
        assert!(!types.int.is_assignable_from(&types.double));
    }

    #[test]
    fn test_interface_inheritance() {
        let base = TypeBuilder::interface("IBase").build();
        let derived = TypeBuilder::interface("IDerived").implements(&base).build();
        let class = TypeBuilder::class("Impl").implements(&derived).build();
        let sub = TypeBuilder::class("Sub").base(&class).build();

        assert!(base.is_assignable_from(&sub));
        assert!(derived.is_assignable_from(&class));
        assert!(builtin().object.is_assignable_from(&derived));
    }

    #[test]
    fn test_nullability_and_defaults() {
        let types = builtin();
        assert!(!types.int.is_nullable());
        assert!(types.string.is_nullable());
        assert_eq!(types.int.default_value(), Value::Int(0));
        assert_eq!(types.string.default_value(), Value::Null);
    }

    #[test]
    fn test_static_fields_start_at_default() {
        let types = builtin();
        let counter = TypeBuilder::class("Counter")
            .static_field("count", &types.int, Value::Int(3))
            .member(MemberInfo::field("total", &types.int).with_flags(MemberFlags::STATIC))
            .build();

        assert_eq!(counter.static_value("count"), Some(Value::Int(3)));
        assert_eq!(counter.static_value("total"), Some(Value::Int(0)));
        counter.set_static_value("count", Value::Int(4));
        assert_eq!(counter.static_value("count"), Some(Value::Int(4)));
    }
}
