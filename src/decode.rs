//! Transport decoding.
//!
//! The GitHub contents API returns file bodies as base64 wrapped at 60
//! columns; the npm registry returns the README as plain text. Decoding is
//! strict: malformed base64 or invalid UTF-8 is a [`RampUpError::Decoding`],
//! which callers treat the same as a missing document.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::RampUpError;
use crate::models::{Encoding, RawDocument};

/// Decode a fetched document into text.
pub fn decode(doc: &RawDocument) -> Result<String, RampUpError> {
    decode_content(&doc.content, doc.encoding)
}

pub fn decode_content(content: &str, encoding: Encoding) -> Result<String, RampUpError> {
    match encoding {
        Encoding::Plain => Ok(content.to_string()),
        Encoding::Base64 => {
            let compact: String = content
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            let bytes = STANDARD.decode(compact.as_bytes())?;
            Ok(String::from_utf8(bytes)?)
        }
    }
}
