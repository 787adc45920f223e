//! # Page Update Codec
//!
//! Converts between the editable text of a page and the opaque update bytes
//! exchanged with the document service, plus the base64 armor used on the wire.
//!
//! The bytes are never interpreted beyond UTF-8; merge semantics belong to the
//! service.

use crate::shared::error::DocsResult;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Text to update bytes
pub fn encode(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

/// Update bytes to text. An empty payload is the empty page.
pub fn decode(bytes: &[u8]) -> DocsResult<String> {
    if bytes.is_empty() {
        return Ok(String::new());
    }
    Ok(String::from_utf8(bytes.to_vec())?)
}

/// Base64-armor update bytes for transport. Zero-length input armors to `""`.
pub fn armor(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Remove the transport armor. `""` yields an empty payload.
pub fn dearmor(armored: &str) -> DocsResult<Vec<u8>> {
    let armored = armored.trim();
    if armored.is_empty() {
        return Ok(Vec::new());
    }
    Ok(STANDARD.decode(armored)?)
}

/// `encode` then `armor`, the form sent by a page save
pub fn encode_armored(text: &str) -> String {
    armor(&encode(text))
}
