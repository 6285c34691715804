// Tue Feb 10 2026 - Alex

use indexmap::IndexMap;
use itertools::Itertools;
use std::fmt;

/// Engine-neutral value crossing the boundary between a script and the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Nil,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Array(Vec<HostValue>),
    Table(IndexMap<String, HostValue>),
}

impl HostValue {
    pub fn nil() -> Self {
        HostValue::Nil
    }

    pub fn boolean(b: bool) -> Self {
        HostValue::Boolean(b)
    }

    pub fn integer(n: i64) -> Self {
        HostValue::Integer(n)
    }

    pub fn number(n: f64) -> Self {
        HostValue::Number(n)
    }

    pub fn string(s: impl Into<String>) -> Self {
        HostValue::String(s.into())
    }

    pub fn array(items: Vec<HostValue>) -> Self {
        HostValue::Array(items)
    }

    pub fn table<K: Into<String>>(items: impl IntoIterator<Item = (K, HostValue)>) -> Self {
        HostValue::Table(items.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, HostValue::Nil)
    }

    /// Booleans, numbers and strings. These are the only values calls into a script accept.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            HostValue::Boolean(_) | HostValue::Integer(_) | HostValue::Number(_) | HostValue::String(_)
        )
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            HostValue::Integer(n) => Some(*n),
            HostValue::Number(n) if n.fract() == 0.0 => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            HostValue::Number(n) => Some(*n),
            HostValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<HostValue>> {
        match self {
            HostValue::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&IndexMap<String, HostValue>> {
        match self {
            HostValue::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&HostValue> {
        self.as_table().and_then(|t| t.get(key))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::Nil => "nil",
            HostValue::Boolean(_) => "boolean",
            HostValue::Integer(_) => "integer",
            HostValue::Number(_) => "number",
            HostValue::String(_) => "string",
            HostValue::Array(_) => "array",
            HostValue::Table(_) => "table",
        }
    }
}

impl Default for HostValue {
    fn default() -> Self {
        HostValue::Nil
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Nil => write!(f, "nil"),
            HostValue::Boolean(b) => write!(f, "{}", b),
            HostValue::Integer(n) => write!(f, "{}", n),
            HostValue::Number(n) => write!(f, "{}", n),
            HostValue::String(s) => write!(f, "{}", s),
            HostValue::Array(a) => write!(f, "[{}]", a.iter().join(", ")),
            HostValue::Table(t) => write!(f, "{{{}}}", t.iter().map(|(k, v)| format!("{}: {}", k, v)).join(", ")),
        }
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Boolean(b)
    }
}

impl From<i64> for HostValue {
    fn from(n: i64) -> Self {
        HostValue::Integer(n)
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        HostValue::Number(n)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::String(s)
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(HostValue::Nil)
    }
}

/// Declared parameter or return type of a host function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostType {
    Void,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Table,
    Any,
}

impl HostType {
    pub fn accepts(&self, value: &HostValue) -> bool {
        match (self, value) {
            (HostType::Any, _) => true,
            (HostType::Boolean, HostValue::Boolean(_)) => true,
            (HostType::Integer, v) => v.as_int().is_some(),
            (HostType::Number, HostValue::Number(_) | HostValue::Integer(_)) => true,
            (HostType::String, HostValue::String(_)) => true,
            (HostType::Array, HostValue::Array(_)) => true,
            (HostType::Table, HostValue::Table(_)) => true,
            _ => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HostType::Void => "void",
            HostType::Boolean => "boolean",
            HostType::Integer => "integer",
            HostType::Number => "number",
            HostType::String => "string",
            HostType::Array => "array",
            HostType::Table => "table",
            HostType::Any => "any",
        }
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
