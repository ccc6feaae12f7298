use codespan_reporting::diagnostic::{Diagnostic, Label};
use itertools::Itertools;
use std::fmt;

use crate::source::{ByteRange, FileId};

/// Problems found while parsing or validating a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    UnexpectedCharacter {
        range: ByteRange,
    },
    UnexpectedToken {
        range: ByteRange,
        found: &'static str,
        expected: Vec<&'static str>,
    },
    UnexpectedEof {
        range: ByteRange,
        expected: Vec<&'static str>,
    },
    InvalidInteger {
        range: ByteRange,
        literal: String,
    },
    ReservedTypeName {
        range: ByteRange,
        name: String,
    },
    DuplicateDefinition {
        range: ByteRange,
        previous: ByteRange,
        name: String,
    },
    DuplicateFieldName {
        range: ByteRange,
        previous: ByteRange,
        definition: String,
        name: String,
    },
    DuplicateFieldNumber {
        range: ByteRange,
        previous: ByteRange,
        message: String,
        number: u32,
    },
    ZeroFieldNumber {
        range: ByteRange,
        message: String,
        field: String,
    },
    DuplicateMemberValue {
        range: ByteRange,
        previous: ByteRange,
        enum_name: String,
        value: u32,
    },
    RepeatedStructField {
        range: ByteRange,
        struct_name: String,
        field: String,
    },
    EmptyStruct {
        range: ByteRange,
        struct_name: String,
    },
    UnresolvedType {
        range: ByteRange,
        definition: String,
        name: String,
        suggestion: Option<String>,
    },
    RecursiveStruct {
        range: ByteRange,
        cycle: Vec<String>,
    },
}

impl SchemaError {
    pub fn range(&self) -> ByteRange {
        match self {
            SchemaError::UnexpectedCharacter { range }
            | SchemaError::UnexpectedToken { range, .. }
            | SchemaError::UnexpectedEof { range, .. }
            | SchemaError::InvalidInteger { range, .. }
            | SchemaError::ReservedTypeName { range, .. }
            | SchemaError::DuplicateDefinition { range, .. }
            | SchemaError::DuplicateFieldName { range, .. }
            | SchemaError::DuplicateFieldNumber { range, .. }
            | SchemaError::ZeroFieldNumber { range, .. }
            | SchemaError::DuplicateMemberValue { range, .. }
            | SchemaError::RepeatedStructField { range, .. }
            | SchemaError::EmptyStruct { range, .. }
            | SchemaError::UnresolvedType { range, .. }
            | SchemaError::RecursiveStruct { range, .. } => *range,
        }
    }

    pub fn to_diagnostic(&self, file_id: FileId) -> Diagnostic<FileId> {
        let primary_label = |range: &ByteRange| Label::primary(file_id, *range);
        let secondary_label = |range: &ByteRange| Label::secondary(file_id, *range);

        let diagnostic = Diagnostic::error().with_message(self.to_string());
        match self {
            SchemaError::UnexpectedCharacter { range } => {
                diagnostic.with_labels(vec![primary_label(range)])
            }
            SchemaError::UnexpectedToken {
                range, expected, ..
            }
            | SchemaError::UnexpectedEof { range, expected } => diagnostic
                .with_labels(vec![primary_label(range).with_message("unexpected token")])
                .with_notes(vec![format!(
                    "expected {}",
                    expected.iter().format_with(" or ", |token, f| f(&format_args!(
                        "`{token}`"
                    ))),
                )]),
            SchemaError::InvalidInteger { range, .. } => diagnostic
                .with_labels(vec![primary_label(range).with_message("invalid integer")])
                .with_notes(vec![format!(
                    "expected a decimal integer between 0 and {}",
                    u32::MAX,
                )]),
            SchemaError::ReservedTypeName { range, .. } => diagnostic
                .with_labels(vec![primary_label(range).with_message("reserved name")]),
            SchemaError::DuplicateDefinition {
                range, previous, ..
            } => diagnostic.with_labels(vec![
                primary_label(range).with_message("redefined here"),
                secondary_label(previous).with_message("first defined here"),
            ]),
            SchemaError::DuplicateFieldName {
                range, previous, ..
            } => diagnostic.with_labels(vec![
                primary_label(range).with_message("duplicate field"),
                secondary_label(previous).with_message("first declared here"),
            ]),
            SchemaError::DuplicateFieldNumber {
                range, previous, ..
            } => diagnostic.with_labels(vec![
                primary_label(range).with_message("duplicate field number"),
                secondary_label(previous).with_message("first used here"),
            ]),
            SchemaError::ZeroFieldNumber { range, .. } => diagnostic
                .with_labels(vec![primary_label(range).with_message("reserved field number")])
                .with_notes(vec![
                    "field number 0 terminates every encoded message".to_owned()
                ]),
            SchemaError::DuplicateMemberValue {
                range, previous, ..
            } => diagnostic.with_labels(vec![
                primary_label(range).with_message("duplicate value"),
                secondary_label(previous).with_message("first used here"),
            ]),
            SchemaError::RepeatedStructField { range, .. } => diagnostic
                .with_labels(vec![primary_label(range).with_message("repeated field")])
                .with_notes(vec!["only message fields may be repeated".to_owned()]),
            SchemaError::EmptyStruct { range, .. } => diagnostic
                .with_labels(vec![primary_label(range).with_message("struct without fields")])
                .with_notes(vec!["help: use a message with no fields instead".to_owned()]),
            SchemaError::UnresolvedType {
                range, suggestion, ..
            } => {
                let diagnostic = diagnostic
                    .with_labels(vec![primary_label(range).with_message("unknown type")]);
                match suggestion {
                    Some(suggestion) => {
                        diagnostic.with_notes(vec![format!("help: did you mean `{suggestion}`?")])
                    }
                    None => diagnostic,
                }
            }
            SchemaError::RecursiveStruct { range, cycle } => diagnostic
                .with_labels(vec![primary_label(range).with_message("infinitely sized struct")])
                .with_notes(vec![
                    format!("cycle: {}", cycle.iter().join(" -> ")),
                    "help: wrap the field in a message to make it optional".to_owned(),
                ]),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::UnexpectedCharacter { .. } => write!(f, "unexpected character"),
            SchemaError::UnexpectedToken { found, .. } => write!(f, "unexpected token `{found}`"),
            SchemaError::UnexpectedEof { .. } => write!(f, "unexpected end of schema"),
            SchemaError::InvalidInteger { literal, .. } => {
                write!(f, "invalid integer literal `{literal}`")
            }
            SchemaError::ReservedTypeName { name, .. } => {
                write!(f, "`{name}` is a built-in type and cannot be redefined")
            }
            SchemaError::DuplicateDefinition { name, .. } => {
                write!(f, "the type `{name}` is defined multiple times")
            }
            SchemaError::DuplicateFieldName {
                definition, name, ..
            } => write!(f, "duplicate field `{name}` in `{definition}`"),
            SchemaError::DuplicateFieldNumber {
                message, number, ..
            } => write!(f, "duplicate field number {number} in message `{message}`"),
            SchemaError::ZeroFieldNumber { message, field, .. } => {
                write!(f, "field `{field}` in message `{message}` uses field number 0")
            }
            SchemaError::DuplicateMemberValue {
                enum_name, value, ..
            } => write!(f, "duplicate value {value} in enum `{enum_name}`"),
            SchemaError::RepeatedStructField {
                struct_name, field, ..
            } => write!(f, "field `{field}` in struct `{struct_name}` cannot be repeated"),
            SchemaError::EmptyStruct { struct_name, .. } => {
                write!(f, "struct `{struct_name}` has no fields")
            }
            SchemaError::UnresolvedType {
                definition, name, ..
            } => write!(f, "cannot find type `{name}` used in `{definition}`"),
            SchemaError::RecursiveStruct { cycle, .. } => match cycle.first() {
                Some(name) => write!(f, "struct `{name}` contains itself"),
                None => write!(f, "recursive struct"),
            },
        }
    }
}

impl std::error::Error for SchemaError {}

impl From<super::lexer::Error> for SchemaError {
    fn from(error: super::lexer::Error) -> Self {
        match error {
            super::lexer::Error::UnexpectedCharacter { range } => {
                SchemaError::UnexpectedCharacter { range }
            }
        }
    }
}
