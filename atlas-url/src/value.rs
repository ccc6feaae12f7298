//! Dynamically typed values that the codec reads and writes.

use std::collections::BTreeMap;

/// A value of some schema type.
///
/// Messages map field numbers to values, so an absent entry means the field
/// is unset, which is distinct from a field set to zero or to an empty list.
/// The map is ordered, which gives the ascending field-number emission order
/// used on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(u8),
    Int(i32),
    Uint(u32),
    Int64(i64),
    Uint64(u64),
    Float(f32),
    String(String),
    /// The integer value of an enum member.
    Enum(u32),
    /// Struct fields, in declaration order.
    Struct(Vec<Value>),
    /// Message fields keyed by field number.
    Message(BTreeMap<u32, Value>),
    /// The elements of a repeated message field.
    Array(Vec<Value>),
}

impl Value {
    /// A message with no fields set.
    pub fn empty_message() -> Value {
        Value::Message(BTreeMap::new())
    }

    /// Build a message from `(field number, value)` pairs.
    pub fn message(fields: impl IntoIterator<Item = (u32, Value)>) -> Value {
        Value::Message(fields.into_iter().collect())
    }

    /// A short description of the kind of value, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Byte(_) => "byte",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Int64(_) => "int64",
            Value::Uint64(_) => "uint64",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Enum(_) => "enum",
            Value::Struct(_) => "struct",
            Value::Message(_) => "message",
            Value::Array(_) => "array",
        }
    }

    /// Look up a field of a message value.
    pub fn field(&self, number: u32) -> Option<&Value> {
        match self {
            Value::Message(fields) => fields.get(&number),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Value {
        Value::Int(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Value {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Value {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Value {
        Value::String(value)
    }
}
