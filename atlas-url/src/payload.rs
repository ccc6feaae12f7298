//! Explorer page state, and the URL tokens that carry it.

use std::fmt;
use std::path::PathBuf;

use crate::codec::Codec;
use crate::error::{DecodeError, EncodeError, FramingError};
use crate::{framing, json};

mod frames;
pub mod model;
mod table;

pub use self::frames::{create_payload, metadata_filters, CellAnnotation, METADATA_CATEGORIES};
pub use self::model::ExplorePageInitPayload;
pub use self::table::{annotation_table, gene_table, table_to_json, PayloadTable};

/// The schema type that page state is encoded as.
pub const PAYLOAD_TYPE: &str = "ExplorePageInitPayload";

/// Errors that originate when building payloads or their tables.
#[derive(Debug)]
pub enum PayloadError {
    Io { path: PathBuf, error: std::io::Error },
    Json(serde_json::Error),
    Encode(EncodeError),
    Decode(DecodeError),
    Framing(FramingError),
    /// The gene table has no header line.
    EmptyTable,
    /// The gene table header lacks a required column.
    MissingColumn { name: &'static str },
    /// A gene table row has fewer fields than the header.
    ShortRow { line: usize, column: &'static str },
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadError::Io { path, error } => write!(f, "{}: {error}", path.display()),
            PayloadError::Json(error) => write!(f, "invalid JSON: {error}"),
            PayloadError::Encode(error) => write!(f, "failed to encode payload: {error}"),
            PayloadError::Decode(error) => write!(f, "failed to decode payload: {error}"),
            PayloadError::Framing(error) => write!(f, "invalid payload token: {error}"),
            PayloadError::EmptyTable => write!(f, "table is empty or missing its header"),
            PayloadError::MissingColumn { name } => {
                write!(f, "table header has no `{name}` column")
            }
            PayloadError::ShortRow { line, column } => {
                write!(f, "line {line} of the table has no `{column}` field")
            }
        }
    }
}

impl std::error::Error for PayloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PayloadError::Io { error, .. } => Some(error),
            PayloadError::Json(error) => Some(error),
            PayloadError::Encode(error) => Some(error),
            PayloadError::Decode(error) => Some(error),
            PayloadError::Framing(error) => Some(error),
            PayloadError::EmptyTable
            | PayloadError::MissingColumn { .. }
            | PayloadError::ShortRow { .. } => None,
        }
    }
}

impl From<serde_json::Error> for PayloadError {
    fn from(error: serde_json::Error) -> PayloadError {
        PayloadError::Json(error)
    }
}

impl From<EncodeError> for PayloadError {
    fn from(error: EncodeError) -> PayloadError {
        PayloadError::Encode(error)
    }
}

impl From<DecodeError> for PayloadError {
    fn from(error: DecodeError) -> PayloadError {
        PayloadError::Decode(error)
    }
}

impl From<FramingError> for PayloadError {
    fn from(error: FramingError) -> PayloadError {
        PayloadError::Framing(error)
    }
}

/// Encode page state as a URL token, using a codec for the explorer schema.
pub fn encode_as_query(codec: &Codec, payload: &ExplorePageInitPayload) -> Result<String, PayloadError> {
    let value = json::to_value(codec, PAYLOAD_TYPE, &serde_json::to_value(payload)?)?;
    let bytes = codec.encode(PAYLOAD_TYPE, &value)?;
    Ok(framing::frame(&bytes))
}

/// Recover page state from a URL token.
pub fn decode_query(codec: &Codec, token: &str) -> Result<ExplorePageInitPayload, PayloadError> {
    let bytes = framing::unframe(token)?;
    let value = codec.decode(PAYLOAD_TYPE, &bytes)?;
    let json = json::from_value(codec, PAYLOAD_TYPE, &value)?;
    Ok(serde_json::from_value(json)?)
}
