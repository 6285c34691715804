// Mon Feb 02 2026 - Alex

use crate::reflection::error::InvokeError;
use crate::reflection::types::TypeHandle;
use crate::reflection::value::Value;
use bitflags::bitflags;
use itertools::Itertools;
use std::fmt;
use std::sync::Arc;

pub const CONSTRUCTOR_NAME: &str = ".ctor";
pub const TYPE_INITIALIZER_NAME: &str = ".cctor";

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemberFlags: u32 {
        const PUBLIC = 1 << 0;
        const NON_PUBLIC = 1 << 1;
        const STATIC = 1 << 2;
        const VIRTUAL = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Method,
    Constructor,
    Property,
    Field,
    Event,
    NestedType,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MemberKind::Method => "method",
            MemberKind::Constructor => "constructor",
            MemberKind::Property => "property",
            MemberKind::Field => "field",
            MemberKind::Event => "event",
            MemberKind::NestedType => "nested type",
        };
        write!(f, "{}", name)
    }
}

/// Body of a method, constructor or property accessor. Receives the instance
/// (`None` for static members) and the arguments.
pub type MemberBody = Arc<dyn Fn(Option<&Value>, &[Value]) -> Result<Value, InvokeError> + Send + Sync>;

pub fn body<F>(f: F) -> MemberBody
where
    F: Fn(Option<&Value>, &[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub enum MemberDetail {
    Method {
        parameters: Vec<TypeHandle>,
        return_type: Option<TypeHandle>,
        body: MemberBody,
    },
    Constructor {
        parameters: Vec<TypeHandle>,
        is_static_initializer: bool,
        body: MemberBody,
    },
    Property {
        property_type: TypeHandle,
        indexers: Vec<TypeHandle>,
        getter: Option<MemberBody>,
        setter: Option<MemberBody>,
    },
    Field {
        field_type: TypeHandle,
    },
    Event {
        handler_parameters: Vec<TypeHandle>,
        handler_return: Option<TypeHandle>,
    },
    NestedType {
        nested: TypeHandle,
    },
}

pub struct MemberInfo {
    name: String,
    declaring_type: String,
    flags: MemberFlags,
    detail: MemberDetail,
}

pub type MemberHandle = Arc<MemberInfo>;

fn owned(types: &[&TypeHandle]) -> Vec<TypeHandle> {
    types.iter().map(|t| (*t).clone()).collect()
}

impl MemberInfo {
    fn new(name: &str, detail: MemberDetail) -> Self {
        Self {
            name: name.to_string(),
            declaring_type: String::new(),
            flags: MemberFlags::PUBLIC,
            detail,
        }
    }

    pub fn method<F>(name: &str, parameters: &[&TypeHandle], return_type: Option<&TypeHandle>, body: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        Self::new(
            name,
            MemberDetail::Method {
                parameters: owned(parameters),
                return_type: return_type.cloned(),
                body: Arc::new(body),
            },
        )
    }

    pub fn constructor<F>(parameters: &[&TypeHandle], body: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        Self::new(
            CONSTRUCTOR_NAME,
            MemberDetail::Constructor {
                parameters: owned(parameters),
                is_static_initializer: false,
                body: Arc::new(body),
            },
        )
    }

    pub fn static_initializer<F>(body: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        Self::new(
            TYPE_INITIALIZER_NAME,
            MemberDetail::Constructor {
                parameters: Vec::new(),
                is_static_initializer: true,
                body: Arc::new(body),
            },
        )
        .with_flags(MemberFlags::NON_PUBLIC | MemberFlags::STATIC)
    }

    pub fn property(
        name: &str,
        property_type: &TypeHandle,
        indexers: &[&TypeHandle],
        getter: Option<MemberBody>,
        setter: Option<MemberBody>,
    ) -> Self {
        Self::new(
            name,
            MemberDetail::Property {
                property_type: property_type.clone(),
                indexers: owned(indexers),
                getter,
                setter,
            },
        )
    }

    pub fn field(name: &str, field_type: &TypeHandle) -> Self {
        Self::new(name, MemberDetail::Field { field_type: field_type.clone() })
    }

    pub fn event(name: &str, handler_parameters: &[&TypeHandle], handler_return: Option<&TypeHandle>) -> Self {
        Self::new(
            name,
            MemberDetail::Event {
                handler_parameters: owned(handler_parameters),
                handler_return: handler_return.cloned(),
            },
        )
    }

    pub fn nested_type(nested: &TypeHandle) -> Self {
        Self::new(nested.name(), MemberDetail::NestedType { nested: nested.clone() })
    }

    pub fn with_flags(mut self, flags: MemberFlags) -> Self {
        self.flags = flags;
        self
    }

    pub(crate) fn set_declaring_type(&mut self, name: &str) {
        self.declaring_type = name.to_string();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn flags(&self) -> MemberFlags {
        self.flags
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }

    pub fn detail(&self) -> &MemberDetail {
        &self.detail
    }

    pub fn kind(&self) -> MemberKind {
        match &self.detail {
            MemberDetail::Method { .. } => MemberKind::Method,
            MemberDetail::Constructor { .. } => MemberKind::Constructor,
            MemberDetail::Property { .. } => MemberKind::Property,
            MemberDetail::Field { .. } => MemberKind::Field,
            MemberDetail::Event { .. } => MemberKind::Event,
            MemberDetail::NestedType { .. } => MemberKind::NestedType,
        }
    }

    /// Parameter types of methods and constructors, indexer types of properties.
    pub fn parameters(&self) -> &[TypeHandle] {
        match &self.detail {
            MemberDetail::Method { parameters, .. } | MemberDetail::Constructor { parameters, .. } => parameters,
            MemberDetail::Property { indexers, .. } => indexers,
            MemberDetail::Event { handler_parameters, .. } => handler_parameters,
            _ => &[],
        }
    }

    pub fn return_type(&self) -> Option<&TypeHandle> {
        match &self.detail {
            MemberDetail::Method { return_type, .. } => return_type.as_ref(),
            MemberDetail::Event { handler_return, .. } => handler_return.as_ref(),
            _ => None,
        }
    }

    /// Type of the stored value for fields and properties.
    pub fn value_type(&self) -> Option<&TypeHandle> {
        match &self.detail {
            MemberDetail::Field { field_type } => Some(field_type),
            MemberDetail::Property { property_type, .. } => Some(property_type),
            _ => None,
        }
    }

    pub fn is_static_initializer(&self) -> bool {
        matches!(
            self.detail,
            MemberDetail::Constructor { is_static_initializer: true, .. }
        )
    }

    /// Runs the body of a method or constructor exactly as declared.
    pub fn invoke(&self, instance: Option<&Value>, args: &[Value]) -> Result<Value, InvokeError> {
        match &self.detail {
            MemberDetail::Method { parameters, body, .. } | MemberDetail::Constructor { parameters, body, .. } => {
                if parameters.len() != args.len() {
                    return Err(InvokeError::ArgumentCount {
                        expected: parameters.len(),
                        actual: args.len(),
                    });
                }
                body(instance, args)
            }
            _ => Err(InvokeError::Custom(format!("{} '{}' is not invocable", self.kind(), self.name))),
        }
    }

    pub fn signature(&self) -> String {
        let params = self.parameters().iter().map(|t| t.name()).join(", ");
        match &self.detail {
            MemberDetail::Method { return_type, .. } => format!(
                "{}({}) -> {}",
                self.name,
                params,
                return_type.as_ref().map(|t| t.name()).unwrap_or("void")
            ),
            MemberDetail::Constructor { .. } => format!("{}({})", self.name, params),
            MemberDetail::Property { property_type, indexers, .. } if !indexers.is_empty() => {
                format!("{}[{}]: {}", self.name, params, property_type)
            }
            MemberDetail::Property { property_type, .. } => format!("{}: {}", self.name, property_type),
            MemberDetail::Field { field_type } => format!("{}: {}", self.name, field_type),
            MemberDetail::Event { .. } => format!("event {}({})", self.name, params),
            MemberDetail::NestedType { nested } => format!("nested {}", nested),
        }
    }
}

impl fmt::Debug for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberInfo")
            .field("declaring_type", &self.declaring_type)
            .field("signature", &self.signature())
            .field("flags", &self.flags)
            .finish()
    }
}

impl fmt::Display for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_type, self.signature())
    }
}
