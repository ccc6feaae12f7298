//! Conversion between encoded bytes and tokens that can be placed in a URL.
//!
//! Bytes are written as standard padded base64, and the characters of that
//! alphabet which are not safe in a URL component (`+`, `/` and `=`) are then
//! percent-escaped, in the same way as `encodeURIComponent`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::FramingError;

/// Characters escaped by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Convert bytes to a URL-safe token.
pub fn frame(bytes: &[u8]) -> String {
    let base64 = STANDARD.encode(bytes);
    utf8_percent_encode(&base64, URI_COMPONENT).to_string()
}

/// Recover the bytes from a token produced by [`frame`].
pub fn unframe(token: &str) -> Result<Vec<u8>, FramingError> {
    let base64 = percent_decode_str(token)
        .decode_utf8()
        .map_err(|_| FramingError::InvalidPercentEncoding)?;
    Ok(STANDARD.decode(base64.as_bytes())?)
}
