//! Mapping between JSON and schema values.
//!
//! Structs and messages are JSON objects keyed by field name, enums are
//! member names, repeated fields are arrays, and everything else is the
//! obvious JSON scalar. A `null` message field is treated as unset.

use serde_json::{Map, Number};

use crate::codec::{Codec, CompiledField, CompiledKind, DefId, Ty};
use crate::error::{DecodeError, EncodeError};
use crate::schema::Prim;
use crate::value::Value;

/// Convert JSON to a value of the type called `name`.
pub fn to_value(codec: &Codec, name: &str, json: &serde_json::Value) -> Result<Value, EncodeError> {
    match codec.lookup(name) {
        Some(id) => def_to_value(codec, id, json),
        None => Err(EncodeError::UnknownType {
            name: name.to_owned(),
        }),
    }
}

/// Convert a value of the type called `name` to JSON.
pub fn from_value(codec: &Codec, name: &str, value: &Value) -> Result<serde_json::Value, DecodeError> {
    match codec.lookup(name) {
        Some(id) => def_from_value(codec, id, value),
        None => Err(DecodeError::UnknownType {
            name: name.to_owned(),
        }),
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

fn ty_to_value(codec: &Codec, ty: &Ty, json: &serde_json::Value) -> Result<Value, EncodeError> {
    match ty {
        Ty::Prim(prim) => prim_to_value(*prim, json),
        Ty::Def(id) => def_to_value(codec, *id, json),
        Ty::Unresolved(name) => Err(EncodeError::UnknownType { name: name.clone() }),
    }
}

fn out_of_range(ty: Prim, json: &serde_json::Value) -> EncodeError {
    EncodeError::OutOfRange {
        ty: ty.name(),
        value: json.to_string(),
    }
}

fn prim_to_value(prim: Prim, json: &serde_json::Value) -> Result<Value, EncodeError> {
    let mismatch = || EncodeError::Mismatch {
        ty: prim.name().to_owned(),
        found: json_kind(json),
    };
    let integer = || match json {
        serde_json::Value::Number(number) if number.is_i64() || number.is_u64() => Ok(number),
        serde_json::Value::Number(_) => Err(out_of_range(prim, json)),
        _ => Err(mismatch()),
    };

    Ok(match prim {
        Prim::Bool => Value::Bool(json.as_bool().ok_or_else(mismatch)?),
        Prim::Byte => {
            let number = integer()?.as_u64().and_then(|n| u8::try_from(n).ok());
            Value::Byte(number.ok_or_else(|| out_of_range(prim, json))?)
        }
        Prim::Int => {
            let number = integer()?.as_i64().and_then(|n| i32::try_from(n).ok());
            Value::Int(number.ok_or_else(|| out_of_range(prim, json))?)
        }
        Prim::Uint => {
            let number = integer()?.as_u64().and_then(|n| u32::try_from(n).ok());
            Value::Uint(number.ok_or_else(|| out_of_range(prim, json))?)
        }
        Prim::Int64 => Value::Int64(integer()?.as_i64().ok_or_else(|| out_of_range(prim, json))?),
        Prim::Uint64 => Value::Uint64(integer()?.as_u64().ok_or_else(|| out_of_range(prim, json))?),
        Prim::Float => {
            // JSON numbers are always finite, so an infinite float overflowed.
            let number = json.as_f64().ok_or_else(mismatch)? as f32;
            if !number.is_finite() {
                return Err(out_of_range(prim, json));
            }
            Value::Float(number)
        }
        Prim::String => Value::String(json.as_str().ok_or_else(mismatch)?.to_owned()),
    })
}

fn def_to_value(codec: &Codec, id: DefId, json: &serde_json::Value) -> Result<Value, EncodeError> {
    let def = codec.definition(id);
    let mismatch = || EncodeError::Mismatch {
        ty: def.name.clone(),
        found: json_kind(json),
    };

    match &def.kind {
        CompiledKind::Enum { .. } => {
            let member = json.as_str().ok_or_else(mismatch)?;
            match def.member_value(member) {
                Some(value) => Ok(Value::Enum(value)),
                None => Err(EncodeError::UnknownEnumMember {
                    enum_name: def.name.clone(),
                    member: member.to_owned(),
                }),
            }
        }
        CompiledKind::Struct { fields } => {
            let object = json.as_object().ok_or_else(mismatch)?;
            check_field_names(&def.name, fields, object)?;
            let values = fields
                .iter()
                .map(|field| match object.get(&field.name) {
                    Some(json) => ty_to_value(codec, &field.ty, json),
                    None => Err(EncodeError::MissingStructField {
                        struct_name: def.name.clone(),
                        field: field.name.clone(),
                    }),
                })
                .collect::<Result<_, _>>()?;
            Ok(Value::Struct(values))
        }
        CompiledKind::Message { fields, .. } => {
            let object = json.as_object().ok_or_else(mismatch)?;
            check_field_names(&def.name, fields, object)?;
            let mut values = std::collections::BTreeMap::new();
            for field in fields {
                let json = match object.get(&field.name) {
                    None | Some(serde_json::Value::Null) => continue,
                    Some(json) => json,
                };
                let value = if field.repeated {
                    let elems = json.as_array().ok_or_else(|| EncodeError::Mismatch {
                        ty: format!("{}[]", codec.ty_name(&field.ty)),
                        found: json_kind(json),
                    })?;
                    Value::Array(
                        elems
                            .iter()
                            .map(|elem| ty_to_value(codec, &field.ty, elem))
                            .collect::<Result<_, _>>()?,
                    )
                } else {
                    ty_to_value(codec, &field.ty, json)?
                };
                values.insert(field.number, value);
            }
            Ok(Value::Message(values))
        }
    }
}

fn check_field_names(
    definition: &str,
    fields: &[CompiledField],
    object: &Map<String, serde_json::Value>,
) -> Result<(), EncodeError> {
    match object
        .keys()
        .find(|key| fields.iter().all(|field| &field.name != *key))
    {
        Some(name) => Err(EncodeError::UnknownFieldName {
            definition: definition.to_owned(),
            name: name.clone(),
        }),
        None => Ok(()),
    }
}

fn ty_from_value(codec: &Codec, ty: &Ty, value: &Value) -> Result<serde_json::Value, DecodeError> {
    match ty {
        Ty::Prim(prim) => prim_from_value(*prim, value),
        Ty::Def(id) => def_from_value(codec, *id, value),
        Ty::Unresolved(name) => Err(DecodeError::UnknownType { name: name.clone() }),
    }
}

/// Convert a float to the shortest JSON number that reads back as the same
/// float. Non-finite floats have no JSON representation and become `null`.
fn float_to_json(value: f32) -> serde_json::Value {
    value
        .to_string()
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map_or(serde_json::Value::Null, serde_json::Value::Number)
}

fn prim_from_value(prim: Prim, value: &Value) -> Result<serde_json::Value, DecodeError> {
    Ok(match (prim, value) {
        (Prim::Bool, Value::Bool(value)) => serde_json::Value::from(*value),
        (Prim::Byte, Value::Byte(value)) => serde_json::Value::from(*value),
        (Prim::Int, Value::Int(value)) => serde_json::Value::from(*value),
        (Prim::Uint, Value::Uint(value)) => serde_json::Value::from(*value),
        (Prim::Int64, Value::Int64(value)) => serde_json::Value::from(*value),
        (Prim::Uint64, Value::Uint64(value)) => serde_json::Value::from(*value),
        (Prim::Float, Value::Float(value)) => float_to_json(*value),
        (Prim::String, Value::String(value)) => serde_json::Value::from(value.as_str()),
        (prim, value) => {
            return Err(DecodeError::Mismatch {
                ty: prim.name().to_owned(),
                found: value.kind(),
            })
        }
    })
}

fn def_from_value(codec: &Codec, id: DefId, value: &Value) -> Result<serde_json::Value, DecodeError> {
    let def = codec.definition(id);
    let mismatch = || DecodeError::Mismatch {
        ty: def.name.clone(),
        found: value.kind(),
    };

    match (&def.kind, value) {
        (CompiledKind::Enum { .. }, Value::Enum(code)) => match def.member_name(*code) {
            Some(member) => Ok(serde_json::Value::from(member)),
            None => Err(DecodeError::InvalidEnumValue {
                enum_name: def.name.clone(),
                value: *code,
            }),
        },
        (CompiledKind::Struct { fields }, Value::Struct(values)) if fields.len() == values.len() => {
            let mut object = Map::new();
            for (field, value) in fields.iter().zip(values) {
                object.insert(field.name.clone(), ty_from_value(codec, &field.ty, value)?);
            }
            Ok(serde_json::Value::Object(object))
        }
        (CompiledKind::Message { fields, by_number }, Value::Message(values)) => {
            let mut object = Map::new();
            for (number, value) in values {
                let field = match by_number.get(number) {
                    Some(index) => &fields[*index],
                    None => {
                        return Err(DecodeError::UnknownField {
                            message: def.name.clone(),
                            number: *number,
                            offset: 0,
                        })
                    }
                };
                let json = match (field.repeated, value) {
                    (true, Value::Array(elems)) => serde_json::Value::Array(
                        elems
                            .iter()
                            .map(|elem| ty_from_value(codec, &field.ty, elem))
                            .collect::<Result<_, _>>()?,
                    ),
                    (true, value) => {
                        return Err(DecodeError::Mismatch {
                            ty: format!("{}[]", codec.ty_name(&field.ty)),
                            found: value.kind(),
                        })
                    }
                    (false, value) => ty_from_value(codec, &field.ty, value)?,
                };
                object.insert(field.name.clone(), json);
            }
            Ok(serde_json::Value::Object(object))
        }
        (_, _) => Err(mismatch()),
    }
}
