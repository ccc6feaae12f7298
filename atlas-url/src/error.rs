//! Error types

use std::fmt;

/// Errors that originate when encoding a value.
#[derive(Clone, Debug, PartialEq)]
pub enum EncodeError {
    /// No type with this name exists in the schema.
    UnknownType { name: String },
    /// The value does not have the shape its type requires.
    Mismatch { ty: String, found: &'static str },
    /// A struct value has the wrong number of fields.
    StructArity {
        struct_name: String,
        expected: usize,
        found: usize,
    },
    /// A struct value is missing one of its fields.
    MissingStructField { struct_name: String, field: String },
    /// A message value sets a field number the message does not declare.
    UnknownField { message: String, number: u32 },
    /// A message or struct value names a field the definition does not declare.
    UnknownFieldName { definition: String, name: String },
    /// An enum value with no matching member.
    UnknownEnumValue { enum_name: String, value: u32 },
    /// An enum member name that the enum does not declare.
    UnknownEnumMember { enum_name: String, member: String },
    /// A number that does not fit in the field's type.
    OutOfRange { ty: &'static str, value: String },
    /// Messages nested deeper than the decoder accepts.
    DepthLimitExceeded { message: String },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::UnknownType { name } => write!(f, "unknown type `{name}`"),
            EncodeError::Mismatch { ty, found } => {
                write!(f, "expected a value of type `{ty}`, found {found}")
            }
            EncodeError::StructArity {
                struct_name,
                expected,
                found,
            } => write!(
                f,
                "struct `{struct_name}` has {expected} fields, but the value has {found}"
            ),
            EncodeError::MissingStructField { struct_name, field } => {
                write!(f, "missing field `{field}` of struct `{struct_name}`")
            }
            EncodeError::UnknownField { message, number } => {
                write!(f, "message `{message}` has no field numbered {number}")
            }
            EncodeError::UnknownFieldName { definition, name } => {
                write!(f, "`{definition}` has no field named `{name}`")
            }
            EncodeError::UnknownEnumValue { enum_name, value } => {
                write!(f, "enum `{enum_name}` has no member with value {value}")
            }
            EncodeError::UnknownEnumMember { enum_name, member } => {
                write!(f, "enum `{enum_name}` has no member named `{member}`")
            }
            EncodeError::OutOfRange { ty, value } => {
                write!(f, "{value} is out of range for `{ty}`")
            }
            EncodeError::DepthLimitExceeded { message } => {
                write!(f, "message `{message}` is nested too deeply to be decoded")
            }
        }
    }
}

impl std::error::Error for EncodeError {}

/// Errors that originate when decoding bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// No type with this name exists in the schema.
    UnknownType { name: String },
    /// The end of the data was reached before a value was complete.
    UnexpectedEndOfBuffer { offset: usize },
    /// A variable-length integer did not fit in its type.
    VarintOverflow { offset: usize },
    InvalidBool { offset: usize, byte: u8 },
    InvalidUtf8 { offset: usize },
    /// A field number the message does not declare.
    UnknownField {
        message: String,
        number: u32,
        offset: usize,
    },
    /// An enum value with no matching member, for an enum without a zero
    /// member to fall back to.
    InvalidEnumValue { enum_name: String, value: u32 },
    /// Messages were nested more deeply than the decoder allows.
    DepthLimitExceeded { offset: usize },
    /// Data remained after the value was decoded.
    TrailingBytes { offset: usize, len: usize },
    /// A decoded value does not have the shape its type requires.
    Mismatch { ty: String, found: &'static str },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnknownType { name } => write!(f, "unknown type `{name}`"),
            DecodeError::UnexpectedEndOfBuffer { offset } => {
                write!(f, "end of data reached unexpectedly at offset {offset}")
            }
            DecodeError::VarintOverflow { offset } => {
                write!(f, "variable-length integer at offset {offset} is too large")
            }
            DecodeError::InvalidBool { offset, byte } => {
                write!(f, "invalid bool byte {byte:#04x} at offset {offset}")
            }
            DecodeError::InvalidUtf8 { offset } => {
                write!(f, "string at offset {offset} is not valid UTF-8")
            }
            DecodeError::UnknownField {
                message,
                number,
                offset,
            } => write!(
                f,
                "message `{message}` has no field numbered {number} (at offset {offset})"
            ),
            DecodeError::InvalidEnumValue { enum_name, value } => {
                write!(f, "enum `{enum_name}` has no member with value {value}")
            }
            DecodeError::DepthLimitExceeded { offset } => {
                write!(f, "messages nested too deeply at offset {offset}")
            }
            DecodeError::TrailingBytes { offset, len } => {
                write!(f, "{len} unexpected bytes after the value at offset {offset}")
            }
            DecodeError::Mismatch { ty, found } => {
                write!(f, "expected a value of type `{ty}`, found {found}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Errors that originate when reading a URL token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FramingError {
    /// Percent-decoding the token did not produce text.
    InvalidPercentEncoding,
    /// The unescaped token is not valid padded base64.
    InvalidBase64(base64::DecodeError),
}

impl From<base64::DecodeError> for FramingError {
    fn from(error: base64::DecodeError) -> Self {
        FramingError::InvalidBase64(error)
    }
}

impl fmt::Display for FramingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramingError::InvalidPercentEncoding => {
                write!(f, "token does not percent-decode to text")
            }
            FramingError::InvalidBase64(error) => write!(f, "token is not valid base64: {error}"),
        }
    }
}

impl std::error::Error for FramingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FramingError::InvalidPercentEncoding => None,
            FramingError::InvalidBase64(error) => Some(error),
        }
    }
}
