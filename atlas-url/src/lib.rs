//! Shareable URL state for the cell-atlas explorer.
//!
//! Page state is described by a schema of enums, structs and messages,
//! encoded with a compact binary format, and carried in URLs as
//! percent-escaped base64.

pub mod codec;
pub mod driver;
pub mod error;
pub mod framing;
pub mod json;
pub mod payload;
pub mod schema;
pub mod source;
pub mod value;

pub use crate::codec::registry::CodecRegistry;
pub use crate::codec::{Codec, TypeCodec};
pub use crate::driver::{Driver, Status};
pub use crate::error::{DecodeError, EncodeError, FramingError};
pub use crate::schema::{Schema, SchemaError};
pub use crate::value::Value;

/// The schema of the explorer's page state.
pub const EXPLORE_SCHEMA: &str = include_str!("../schemas/explore.kiwi");
