//! Schema language.
//!
//! A schema is a list of named definitions, each of which is one of:
//!
//! ```text
//! enum Projection { WEB_IMAGE = 0; CARTESIAN = 1; }
//! struct point2d { float x; float y; }
//! message Camera { Projection projection = 1; point2d center = 2; }
//! ```
//!
//! Message fields are optional and identified on the wire by their field
//! number only. Struct fields are always present and are identified by their
//! position. `Type[]` marks a repeated message field, and `//` starts a line
//! comment.

use std::iter::Peekable;

use crate::source::{BytePos, ByteRange};

mod errors;
pub(crate) mod lexer;
mod validation;

pub use self::errors::SchemaError;
use self::lexer::{Spanned, Token};

/// Built-in field types.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Prim {
    Bool,
    Byte,
    Int,
    Uint,
    Int64,
    Uint64,
    Float,
    String,
}

impl Prim {
    pub const ALL: [Prim; 8] = [
        Prim::Bool,
        Prim::Byte,
        Prim::Int,
        Prim::Uint,
        Prim::Int64,
        Prim::Uint64,
        Prim::Float,
        Prim::String,
    ];

    pub fn from_name(name: &str) -> Option<Prim> {
        Prim::ALL.into_iter().find(|prim| prim.name() == name)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Prim::Bool => "bool",
            Prim::Byte => "byte",
            Prim::Int => "int",
            Prim::Uint => "uint",
            Prim::Int64 => "int64",
            Prim::Uint64 => "uint64",
            Prim::Float => "float",
            Prim::String => "string",
        }
    }
}

/// The type named by a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Prim(Prim),
    Named(String),
}

impl TypeRef {
    fn from_name(name: &str) -> TypeRef {
        match Prim::from_name(name) {
            Some(prim) => TypeRef::Prim(prim),
            None => TypeRef::Named(name.to_owned()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TypeRef::Prim(prim) => prim.name(),
            TypeRef::Named(name) => name,
        }
    }
}

/// A field of a struct or message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub range: ByteRange,
    pub name: String,
    pub ty: TypeRef,
    pub ty_range: ByteRange,
    pub repeated: bool,
    /// The field number. Only message fields have one.
    pub number: Option<u32>,
    pub number_range: Option<ByteRange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub range: ByteRange,
    pub name: String,
    pub value: u32,
    pub value_range: ByteRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionKind {
    Enum(Vec<EnumMember>),
    Struct(Vec<Field>),
    Message(Vec<Field>),
}

impl DefinitionKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            DefinitionKind::Enum(_) => "enum",
            DefinitionKind::Struct(_) => "struct",
            DefinitionKind::Message(_) => "message",
        }
    }

    pub fn fields(&self) -> &[Field] {
        match self {
            DefinitionKind::Enum(_) => &[],
            DefinitionKind::Struct(fields) | DefinitionKind::Message(fields) => fields,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    /// The range of the definition's name.
    pub range: ByteRange,
    pub name: String,
    pub kind: DefinitionKind,
}

/// A validated schema, with definitions in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    definitions: Vec<Definition>,
}

impl Schema {
    /// Parse and validate a schema, stopping at the first problem.
    pub fn parse(source: &str) -> Result<Schema, SchemaError> {
        Schema::parse_all(source).map_err(|mut errors| errors.remove(0))
    }

    /// Parse and validate a schema, returning every validation problem that
    /// was found. Syntax errors stop parsing, so at most one is reported.
    ///
    /// The error vector is never empty.
    pub fn parse_all(source: &str) -> Result<Schema, Vec<SchemaError>> {
        let mut parser = Parser {
            tokens: lexer::tokens(source).peekable(),
            eof: source.len() as BytePos,
        };
        let definitions = parser.parse_definitions().map_err(|error| vec![error])?;
        let errors = validation::validate(&definitions);
        if errors.is_empty() {
            Ok(Schema { definitions })
        } else {
            Err(errors)
        }
    }

    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.definitions.iter().find(|def| def.name == name)
    }
}

/// Parse and validate schema text.
pub fn parse(source: &str) -> Result<Schema, SchemaError> {
    Schema::parse(source)
}

/// A recursive descent parser over the tokens of a schema.
struct Parser<'source, Tokens>
where
    Tokens: Iterator<Item = Result<Spanned<Token<'source>, BytePos>, lexer::Error>>,
{
    tokens: Peekable<Tokens>,
    eof: BytePos,
}

type Parsed<'source> = Spanned<Token<'source>, BytePos>;

impl<'source, Tokens> Parser<'source, Tokens>
where
    Tokens: Iterator<Item = Result<Parsed<'source>, lexer::Error>>,
{
    fn peek(&mut self) -> Result<Option<&Token<'source>>, SchemaError> {
        match self.tokens.peek() {
            None => Ok(None),
            Some(Ok((_, token, _))) => Ok(Some(token)),
            Some(Err(error)) => Err(SchemaError::from(error.clone())),
        }
    }

    fn next(&mut self, expected: &[&'static str]) -> Result<Parsed<'source>, SchemaError> {
        match self.tokens.next() {
            Some(token) => Ok(token?),
            None => Err(SchemaError::UnexpectedEof {
                range: ByteRange::point(self.eof),
                expected: expected.to_vec(),
            }),
        }
    }

    fn expect(&mut self, expected: Token<'static>) -> Result<ByteRange, SchemaError> {
        let description = expected.description();
        let (start, token, end) = self.next(&[description])?;
        if token == expected {
            Ok(ByteRange::new(start, end))
        } else {
            Err(unexpected(start, &token, end, &[description]))
        }
    }

    /// Names of definitions and types. Keywords are not allowed here.
    fn expect_name(&mut self) -> Result<(&'source str, ByteRange), SchemaError> {
        match self.next(&["name"])? {
            (start, Token::Name(name), end) => Ok((name, ByteRange::new(start, end))),
            (start, token, end) => Err(unexpected(start, &token, end, &["name"])),
        }
    }

    /// Names of fields and enum members, which may coincide with keywords.
    fn expect_label(&mut self) -> Result<(&'source str, ByteRange), SchemaError> {
        match self.next(&["name"])? {
            (start, Token::Name(name), end) => Ok((name, ByteRange::new(start, end))),
            (start, keyword @ (Token::KeywordEnum | Token::KeywordMessage | Token::KeywordStruct), end) => {
                Ok((keyword.description(), ByteRange::new(start, end)))
            }
            (start, token, end) => Err(unexpected(start, &token, end, &["name"])),
        }
    }

    fn expect_integer(&mut self) -> Result<(u32, ByteRange), SchemaError> {
        match self.next(&["number literal"])? {
            (start, Token::NumberLiteral(literal), end) => {
                let range = ByteRange::new(start, end);
                match literal.parse::<u32>() {
                    Ok(value) => Ok((value, range)),
                    Err(_) => Err(SchemaError::InvalidInteger {
                        range,
                        literal: literal.to_owned(),
                    }),
                }
            }
            (start, token, end) => Err(unexpected(start, &token, end, &["number literal"])),
        }
    }

    fn parse_definitions(&mut self) -> Result<Vec<Definition>, SchemaError> {
        let mut definitions = Vec::new();
        while self.peek()?.is_some() {
            definitions.push(self.parse_definition()?);
        }
        Ok(definitions)
    }

    fn parse_definition(&mut self) -> Result<Definition, SchemaError> {
        const EXPECTED: &[&str] = &["enum", "struct", "message"];

        let keyword = match self.next(EXPECTED)? {
            (_, keyword @ (Token::KeywordEnum | Token::KeywordStruct | Token::KeywordMessage), _) => {
                keyword
            }
            (start, token, end) => return Err(unexpected(start, &token, end, EXPECTED)),
        };
        let (name, range) = self.expect_name()?;
        self.expect(Token::OpenBrace)?;

        let kind = match keyword {
            Token::KeywordEnum => DefinitionKind::Enum(self.parse_enum_members()?),
            Token::KeywordStruct => DefinitionKind::Struct(self.parse_fields(false)?),
            _ => DefinitionKind::Message(self.parse_fields(true)?),
        };

        Ok(Definition {
            range,
            name: name.to_owned(),
            kind,
        })
    }

    fn at_close_brace(&mut self) -> Result<bool, SchemaError> {
        let at_close = matches!(self.peek()?, Some(Token::CloseBrace));
        if at_close {
            self.next(&["}"])?;
        }
        Ok(at_close)
    }

    fn parse_enum_members(&mut self) -> Result<Vec<EnumMember>, SchemaError> {
        let mut members = Vec::new();
        while !self.at_close_brace()? {
            let (name, name_range) = self.expect_label()?;
            self.expect(Token::Equals)?;
            let (value, value_range) = self.expect_integer()?;
            let end = self.expect(Token::Semicolon)?;

            members.push(EnumMember {
                range: name_range.merge(end),
                name: name.to_owned(),
                value,
                value_range,
            });
        }
        Ok(members)
    }

    fn parse_fields(&mut self, numbered: bool) -> Result<Vec<Field>, SchemaError> {
        let mut fields = Vec::new();
        while !self.at_close_brace()? {
            let (ty, ty_range) = self.expect_name()?;
            let repeated = matches!(self.peek()?, Some(Token::OpenBracket));
            if repeated {
                self.next(&["["])?;
                self.expect(Token::CloseBracket)?;
            }
            let (name, _) = self.expect_label()?;
            let (number, number_range) = if numbered {
                self.expect(Token::Equals)?;
                let (number, range) = self.expect_integer()?;
                (Some(number), Some(range))
            } else {
                (None, None)
            };
            let end = self.expect(Token::Semicolon)?;

            fields.push(Field {
                range: ty_range.merge(end),
                name: name.to_owned(),
                ty: TypeRef::from_name(ty),
                ty_range,
                repeated,
                number,
                number_range,
            });
        }
        Ok(fields)
    }
}

fn unexpected(
    start: BytePos,
    token: &Token<'_>,
    end: BytePos,
    expected: &[&'static str],
) -> SchemaError {
    SchemaError::UnexpectedToken {
        range: ByteRange::new(start, end),
        found: token.description(),
        expected: expected.to_vec(),
    }
}
