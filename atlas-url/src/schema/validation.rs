//! Consistency checks run after parsing.

use fxhash::{FxHashMap, FxHashSet};

use super::{Definition, DefinitionKind, EnumMember, Field, Prim, SchemaError, TypeRef};
use crate::source::ByteRange;

/// Check a parsed list of definitions, returning every problem found.
pub fn validate(definitions: &[Definition]) -> Vec<SchemaError> {
    let mut errors = Vec::new();
    let mut names = FxHashMap::<&str, &Definition>::default();

    for definition in definitions {
        if Prim::from_name(&definition.name).is_some() {
            errors.push(SchemaError::ReservedTypeName {
                range: definition.range,
                name: definition.name.clone(),
            });
            continue;
        }
        match names.get(definition.name.as_str()) {
            Some(previous) => errors.push(SchemaError::DuplicateDefinition {
                range: definition.range,
                previous: previous.range,
                name: definition.name.clone(),
            }),
            None => {
                names.insert(&definition.name, definition);
            }
        }
    }

    for definition in definitions {
        match &definition.kind {
            DefinitionKind::Enum(members) => check_members(definition, members, &mut errors),
            DefinitionKind::Struct(fields) => {
                // Struct encodings are never empty, so every element of a
                // repeated field takes at least one byte.
                if fields.is_empty() {
                    errors.push(SchemaError::EmptyStruct {
                        range: definition.range,
                        struct_name: definition.name.clone(),
                    });
                }
                check_field_names(definition, fields, &mut errors);
                for field in fields.iter().filter(|field| field.repeated) {
                    errors.push(SchemaError::RepeatedStructField {
                        range: field.range,
                        struct_name: definition.name.clone(),
                        field: field.name.clone(),
                    });
                }
            }
            DefinitionKind::Message(fields) => {
                check_field_names(definition, fields, &mut errors);
                check_field_numbers(definition, fields, &mut errors);
            }
        }
        check_references(definition, &names, &mut errors);
    }

    check_struct_cycles(definitions, &names, &mut errors);

    errors
}

fn check_members(definition: &Definition, members: &[EnumMember], errors: &mut Vec<SchemaError>) {
    let mut seen_names = FxHashMap::<&str, ByteRange>::default();
    let mut seen_values = FxHashMap::<u32, ByteRange>::default();

    for member in members {
        if let Some(previous) = seen_names.insert(&member.name, member.range) {
            errors.push(SchemaError::DuplicateFieldName {
                range: member.range,
                previous,
                definition: definition.name.clone(),
                name: member.name.clone(),
            });
        }
        if let Some(previous) = seen_values.insert(member.value, member.value_range) {
            errors.push(SchemaError::DuplicateMemberValue {
                range: member.value_range,
                previous,
                enum_name: definition.name.clone(),
                value: member.value,
            });
        }
    }
}

fn check_field_names(definition: &Definition, fields: &[Field], errors: &mut Vec<SchemaError>) {
    let mut seen = FxHashMap::<&str, ByteRange>::default();
    for field in fields {
        if let Some(previous) = seen.insert(&field.name, field.range) {
            errors.push(SchemaError::DuplicateFieldName {
                range: field.range,
                previous,
                definition: definition.name.clone(),
                name: field.name.clone(),
            });
        }
    }
}

fn check_field_numbers(definition: &Definition, fields: &[Field], errors: &mut Vec<SchemaError>) {
    let mut seen = FxHashMap::<u32, ByteRange>::default();
    for field in fields {
        let (number, range) = match (field.number, field.number_range) {
            (Some(number), Some(range)) => (number, range),
            (_, _) => continue,
        };
        if number == 0 {
            errors.push(SchemaError::ZeroFieldNumber {
                range,
                message: definition.name.clone(),
                field: field.name.clone(),
            });
        } else if let Some(previous) = seen.insert(number, range) {
            errors.push(SchemaError::DuplicateFieldNumber {
                range,
                previous,
                message: definition.name.clone(),
                number,
            });
        }
    }
}

fn check_references(
    definition: &Definition,
    names: &FxHashMap<&str, &Definition>,
    errors: &mut Vec<SchemaError>,
) {
    for field in definition.kind.fields() {
        if let TypeRef::Named(name) = &field.ty {
            if !names.contains_key(name.as_str()) {
                errors.push(SchemaError::UnresolvedType {
                    range: field.ty_range,
                    definition: definition.name.clone(),
                    name: name.clone(),
                    suggestion: suggest_name(name, names),
                });
            }
        }
    }
}

/// Find the closest known type name to an unresolved one, if any is close
/// enough to be a plausible typo.
fn suggest_name(name: &str, names: &FxHashMap<&str, &Definition>) -> Option<String> {
    let max_distance = std::cmp::max(1, name.len() / 3);
    let candidates = names
        .keys()
        .copied()
        .chain(Prim::ALL.iter().map(|prim| prim.name()));

    candidates
        .map(|candidate| (levenshtein::levenshtein(name, candidate), candidate))
        .filter(|(distance, _)| *distance <= max_distance)
        .min()
        .map(|(_, candidate)| candidate.to_owned())
}

/// Structs are laid out inline, so a struct that reaches itself through
/// struct fields alone would have an infinite encoding.
fn check_struct_cycles(
    definitions: &[Definition],
    names: &FxHashMap<&str, &Definition>,
    errors: &mut Vec<SchemaError>,
) {
    for definition in definitions {
        if let DefinitionKind::Struct(_) = definition.kind {
            let mut path = vec![definition.name.as_str()];
            let mut visited = FxHashSet::default();
            if struct_path_to(&definition.name, definition, names, &mut path, &mut visited) {
                errors.push(SchemaError::RecursiveStruct {
                    range: definition.range,
                    cycle: path.into_iter().map(str::to_owned).collect(),
                });
            }
        }
    }
}

fn struct_path_to<'a>(
    target: &str,
    current: &'a Definition,
    names: &FxHashMap<&str, &'a Definition>,
    path: &mut Vec<&'a str>,
    visited: &mut FxHashSet<&'a str>,
) -> bool {
    for field in current.kind.fields() {
        let next = match &field.ty {
            TypeRef::Named(name) => match names.get(name.as_str()) {
                Some(next) if matches!(next.kind, DefinitionKind::Struct(_)) => *next,
                _ => continue,
            },
            TypeRef::Prim(_) => continue,
        };

        path.push(&next.name);
        if next.name == target {
            return true;
        }
        if visited.insert(&next.name) && struct_path_to(target, next, names, path, visited) {
            return true;
        }
        path.pop();
    }
    false
}
