//! Binary encoding of schema values.
//!
//! A [`Codec`] is compiled once from a [`Schema`] and can then encode and
//! decode values of any type the schema defines:
//!
//! | Type      | Encoding                                                      |
//! | --------- | ------------------------------------------------------------- |
//! | `bool`    | one byte, `0x00` or `0x01`                                    |
//! | `byte`    | one byte                                                      |
//! | `int`     | zig-zag, then base-128 varint (`int64` likewise)              |
//! | `uint`    | base-128 varint (`uint64` likewise)                           |
//! | `float`   | four bytes, IEEE-754 single precision, little-endian          |
//! | `string`  | varint byte length, then the UTF-8 bytes                      |
//! | enum      | the member's value as a varint                                |
//! | struct    | each field in declaration order                               |
//! | message   | `number value` for each set field in ascending order, then `0` |
//!
//! Repeated message fields are written as the field number, a varint element
//! count, and then each element.

use fxhash::FxHashMap;

use crate::error::{DecodeError, EncodeError};
use crate::schema::{DefinitionKind, Prim, Schema, TypeRef};
use crate::value::Value;

pub mod read;
pub mod registry;
pub mod write;

use self::read::Buffer;
use self::write::Writer;

/// Maximum nesting of messages accepted when encoding or decoding.
pub const MAX_DECODE_DEPTH: usize = 128;

/// Index of a definition in a compiled codec.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DefId(usize);

/// A field type, with named types bound to their definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ty {
    Prim(Prim),
    Def(DefId),
    /// A name that was not declared. Validated schemas never contain these,
    /// but they are reported when used rather than when compiled.
    Unresolved(String),
}

#[derive(Debug, Clone)]
pub struct CompiledField {
    pub name: String,
    pub ty: Ty,
    pub repeated: bool,
    /// Field number for message fields, `0` for struct fields.
    pub number: u32,
}

#[derive(Debug, Clone)]
pub enum CompiledKind {
    Enum {
        members: Vec<(String, u32)>,
        has_zero: bool,
    },
    Struct {
        fields: Vec<CompiledField>,
    },
    Message {
        fields: Vec<CompiledField>,
        by_number: FxHashMap<u32, usize>,
    },
}

#[derive(Debug, Clone)]
pub struct CompiledDef {
    pub name: String,
    pub kind: CompiledKind,
}

impl CompiledDef {
    pub fn member_name(&self, value: u32) -> Option<&str> {
        match &self.kind {
            CompiledKind::Enum { members, .. } => members
                .iter()
                .find(|(_, member)| *member == value)
                .map(|(name, _)| name.as_str()),
            _ => None,
        }
    }

    pub fn member_value(&self, name: &str) -> Option<u32> {
        match &self.kind {
            CompiledKind::Enum { members, .. } => members
                .iter()
                .find(|(member, _)| member == name)
                .map(|(_, value)| *value),
            _ => None,
        }
    }
}

/// Encoders and decoders for every type in a schema.
///
/// Codecs hold no mutable state, so one can be shared between threads and
/// reused indefinitely.
#[derive(Debug, Clone)]
pub struct Codec {
    definitions: Vec<CompiledDef>,
    names: FxHashMap<String, DefId>,
}

impl Codec {
    /// Compile a validated schema.
    ///
    /// Every definition is registered before any field type is bound, so
    /// definitions may refer to each other in any order, including
    /// recursively through messages.
    pub fn compile(schema: &Schema) -> Codec {
        let names = schema
            .definitions()
            .iter()
            .enumerate()
            .map(|(index, def)| (def.name.clone(), DefId(index)))
            .collect::<FxHashMap<_, _>>();

        let bind = |field: &crate::schema::Field| CompiledField {
            name: field.name.clone(),
            ty: match &field.ty {
                TypeRef::Prim(prim) => Ty::Prim(*prim),
                TypeRef::Named(name) => match names.get(name) {
                    Some(id) => Ty::Def(*id),
                    None => Ty::Unresolved(name.clone()),
                },
            },
            repeated: field.repeated,
            number: field.number.unwrap_or(0),
        };

        let definitions = schema
            .definitions()
            .iter()
            .map(|def| CompiledDef {
                name: def.name.clone(),
                kind: match &def.kind {
                    DefinitionKind::Enum(members) => CompiledKind::Enum {
                        members: members.iter().map(|m| (m.name.clone(), m.value)).collect(),
                        has_zero: members.iter().any(|m| m.value == 0),
                    },
                    DefinitionKind::Struct(fields) => CompiledKind::Struct {
                        fields: fields.iter().map(&bind).collect(),
                    },
                    DefinitionKind::Message(fields) => CompiledKind::Message {
                        fields: fields.iter().map(&bind).collect(),
                        by_number: fields
                            .iter()
                            .enumerate()
                            .filter_map(|(index, f)| Some((f.number?, index)))
                            .collect(),
                    },
                },
            })
            .collect();

        Codec { definitions, names }
    }

    /// Parse, validate and compile schema text.
    pub fn from_source(source: &str) -> Result<Codec, crate::schema::SchemaError> {
        Ok(Codec::compile(&Schema::parse(source)?))
    }

    pub fn lookup(&self, name: &str) -> Option<DefId> {
        self.names.get(name).copied()
    }

    pub fn definition(&self, id: DefId) -> &CompiledDef {
        &self.definitions[id.0]
    }

    pub fn definitions(&self) -> impl Iterator<Item = &CompiledDef> {
        self.definitions.iter()
    }

    /// The encoder and decoder for the type called `name`.
    pub fn type_codec(&self, name: &str) -> Option<TypeCodec<'_>> {
        let id = self.lookup(name)?;
        Some(TypeCodec { codec: self, id })
    }

    /// Encode a value of the type called `name`.
    pub fn encode(&self, name: &str, value: &Value) -> Result<Vec<u8>, EncodeError> {
        match self.type_codec(name) {
            Some(type_codec) => type_codec.encode(value),
            None => Err(EncodeError::UnknownType {
                name: name.to_owned(),
            }),
        }
    }

    /// Decode a value of the type called `name`.
    pub fn decode(&self, name: &str, bytes: &[u8]) -> Result<Value, DecodeError> {
        match self.type_codec(name) {
            Some(type_codec) => type_codec.decode(bytes),
            None => Err(DecodeError::UnknownType {
                name: name.to_owned(),
            }),
        }
    }

    /// The name of a type, as written in the schema.
    pub fn ty_name(&self, ty: &Ty) -> String {
        match ty {
            Ty::Prim(prim) => prim.name().to_owned(),
            Ty::Def(id) => self.definition(*id).name.clone(),
            Ty::Unresolved(name) => name.clone(),
        }
    }

    fn encode_ty(
        &self,
        writer: &mut Writer,
        ty: &Ty,
        value: &Value,
        depth: usize,
    ) -> Result<(), EncodeError> {
        match ty {
            Ty::Prim(prim) => encode_prim(writer, *prim, value),
            Ty::Def(id) => self.encode_def(writer, *id, value, depth),
            Ty::Unresolved(name) => Err(EncodeError::UnknownType { name: name.clone() }),
        }
    }

    fn encode_def(
        &self,
        writer: &mut Writer,
        id: DefId,
        value: &Value,
        depth: usize,
    ) -> Result<(), EncodeError> {
        let def = self.definition(id);
        match (&def.kind, value) {
            (CompiledKind::Enum { .. }, Value::Enum(code)) => {
                if def.member_name(*code).is_none() {
                    return Err(EncodeError::UnknownEnumValue {
                        enum_name: def.name.clone(),
                        value: *code,
                    });
                }
                writer.write_var_u32(*code);
                Ok(())
            }
            (CompiledKind::Struct { fields }, Value::Struct(values)) => {
                if fields.len() != values.len() {
                    return Err(EncodeError::StructArity {
                        struct_name: def.name.clone(),
                        expected: fields.len(),
                        found: values.len(),
                    });
                }
                for (field, value) in fields.iter().zip(values) {
                    self.encode_ty(writer, &field.ty, value, depth)?;
                }
                Ok(())
            }
            (CompiledKind::Message { fields, by_number }, Value::Message(values)) => {
                // Anything deeper would be rejected by `decode_def`.
                if depth >= MAX_DECODE_DEPTH {
                    return Err(EncodeError::DepthLimitExceeded {
                        message: def.name.clone(),
                    });
                }

                for (number, value) in values {
                    let field = match by_number.get(number) {
                        Some(index) => &fields[*index],
                        None => {
                            return Err(EncodeError::UnknownField {
                                message: def.name.clone(),
                                number: *number,
                            })
                        }
                    };

                    writer.write_var_u32(*number);
                    match (field.repeated, value) {
                        (true, Value::Array(elems)) => {
                            writer.write_var_u32(encoded_len(elems.len())?);
                            for elem in elems {
                                self.encode_ty(writer, &field.ty, elem, depth + 1)?;
                            }
                        }
                        (true, _) => {
                            return Err(EncodeError::Mismatch {
                                ty: format!("{}[]", self.ty_name(&field.ty)),
                                found: value.kind(),
                            })
                        }
                        (false, _) => self.encode_ty(writer, &field.ty, value, depth + 1)?,
                    }
                }
                writer.write_var_u32(0);
                Ok(())
            }
            (_, _) => Err(EncodeError::Mismatch {
                ty: def.name.clone(),
                found: value.kind(),
            }),
        }
    }

    fn decode_ty(&self, buffer: &mut Buffer<'_>, ty: &Ty, depth: usize) -> Result<Value, DecodeError> {
        match ty {
            Ty::Prim(prim) => decode_prim(buffer, *prim),
            Ty::Def(id) => self.decode_def(buffer, *id, depth),
            Ty::Unresolved(name) => Err(DecodeError::UnknownType { name: name.clone() }),
        }
    }

    fn decode_def(&self, buffer: &mut Buffer<'_>, id: DefId, depth: usize) -> Result<Value, DecodeError> {
        let def = self.definition(id);

        match &def.kind {
            CompiledKind::Enum { has_zero, .. } => {
                let code = buffer.read_var_u32()?;
                match def.member_name(code) {
                    Some(_) => Ok(Value::Enum(code)),
                    None if *has_zero => Ok(Value::Enum(0)),
                    None => Err(DecodeError::InvalidEnumValue {
                        enum_name: def.name.clone(),
                        value: code,
                    }),
                }
            }
            CompiledKind::Struct { fields } => {
                let values = fields
                    .iter()
                    .map(|field| self.decode_ty(buffer, &field.ty, depth))
                    .collect::<Result<_, _>>()?;
                Ok(Value::Struct(values))
            }
            CompiledKind::Message { fields, by_number } => {
                if depth >= MAX_DECODE_DEPTH {
                    return Err(DecodeError::DepthLimitExceeded {
                        offset: buffer.offset(),
                    });
                }

                let mut values = std::collections::BTreeMap::new();
                loop {
                    let offset = buffer.offset();
                    let number = buffer.read_var_u32()?;
                    if number == 0 {
                        return Ok(Value::Message(values));
                    }
                    let field = match by_number.get(&number) {
                        Some(index) => &fields[*index],
                        None => {
                            return Err(DecodeError::UnknownField {
                                message: def.name.clone(),
                                number,
                                offset,
                            })
                        }
                    };

                    let value = if field.repeated {
                        let count = buffer.read_var_u32()? as usize;
                        // Every element takes at least one byte, since structs
                        // without fields are rejected by validation.
                        if count > buffer.remaining() {
                            return Err(DecodeError::UnexpectedEndOfBuffer {
                                offset: buffer.offset() + buffer.remaining(),
                            });
                        }
                        let mut elems = Vec::with_capacity(count);
                        for _ in 0..count {
                            elems.push(self.decode_ty(buffer, &field.ty, depth + 1)?);
                        }
                        Value::Array(elems)
                    } else {
                        self.decode_ty(buffer, &field.ty, depth + 1)?
                    };
                    values.insert(number, value);
                }
            }
        }
    }
}

/// The encoder and decoder for one type of a [`Codec`].
#[derive(Copy, Clone)]
pub struct TypeCodec<'codec> {
    codec: &'codec Codec,
    id: DefId,
}

impl<'codec> TypeCodec<'codec> {
    pub fn definition(&self) -> &'codec CompiledDef {
        self.codec.definition(self.id)
    }

    pub fn encode(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        let mut writer = Writer::new();
        self.codec.encode_def(&mut writer, self.id, value, 0)?;
        Ok(writer.into_bytes())
    }

    /// Decode a value, which must span all of `bytes`.
    pub fn decode(&self, bytes: &[u8]) -> Result<Value, DecodeError> {
        let mut buffer = Buffer::from(bytes);
        let value = self.codec.decode_def(&mut buffer, self.id, 0)?;
        match buffer.remaining() {
            0 => Ok(value),
            len => Err(DecodeError::TrailingBytes {
                offset: buffer.offset(),
                len,
            }),
        }
    }
}

fn encoded_len(len: usize) -> Result<u32, EncodeError> {
    u32::try_from(len).map_err(|_| EncodeError::OutOfRange {
        ty: "uint",
        value: len.to_string(),
    })
}

fn encode_prim(writer: &mut Writer, prim: Prim, value: &Value) -> Result<(), EncodeError> {
    match (prim, value) {
        (Prim::Bool, Value::Bool(value)) => writer.write_bool(*value),
        (Prim::Byte, Value::Byte(value)) => writer.write_byte(*value),
        (Prim::Int, Value::Int(value)) => writer.write_var_i32(*value),
        (Prim::Uint, Value::Uint(value)) => writer.write_var_u32(*value),
        (Prim::Int64, Value::Int64(value)) => writer.write_var_i64(*value),
        (Prim::Uint64, Value::Uint64(value)) => writer.write_var_u64(*value),
        (Prim::Float, Value::Float(value)) => writer.write_f32le(*value),
        (Prim::String, Value::String(value)) => {
            encoded_len(value.len())?;
            writer.write_string(value);
        }
        (prim, value) => {
            return Err(EncodeError::Mismatch {
                ty: prim.name().to_owned(),
                found: value.kind(),
            })
        }
    }
    Ok(())
}

fn decode_prim(buffer: &mut Buffer<'_>, prim: Prim) -> Result<Value, DecodeError> {
    Ok(match prim {
        Prim::Bool => Value::Bool(buffer.read_bool()?),
        Prim::Byte => Value::Byte(buffer.read_byte()?),
        Prim::Int => Value::Int(buffer.read_var_i32()?),
        Prim::Uint => Value::Uint(buffer.read_var_u32()?),
        Prim::Int64 => Value::Int64(buffer.read_var_i64()?),
        Prim::Uint64 => Value::Uint64(buffer.read_var_u64()?),
        Prim::Float => Value::Float(buffer.read_f32le()?),
        Prim::String => Value::String(buffer.read_string()?),
    })
}

#[cfg(test)]
mod tests;
