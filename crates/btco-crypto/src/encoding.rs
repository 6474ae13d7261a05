//! # Binary-to-Text Decoders
//!
//! The encodings that appear in DID Documents and proofs: multibase
//! (`z` = base58btc, `m` = base64), base64 in either alphabet with or without
//! padding, and hex with an optional `0x` prefix.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;

use crate::error::CryptoError;

/// Multibase prefix for base58btc.
pub const MULTIBASE_BASE58BTC: char = 'z';

/// Multibase prefix for RFC 4648 base64 without padding.
pub const MULTIBASE_BASE64: char = 'm';

/// Decode base64 in any of the four common alphabet/padding combinations.
///
/// Non-canonical trailing bits are rejected, so distinct inputs never
/// collapse onto the same bytes.
pub fn decode_base64(input: &str) -> Result<Vec<u8>, CryptoError> {
    let trimmed = input.trim();
    for engine in [&STANDARD, &STANDARD_NO_PAD, &URL_SAFE, &URL_SAFE_NO_PAD] {
        if let Ok(bytes) = engine.decode(trimmed) {
            return Ok(bytes);
        }
    }
    Err(CryptoError::Encoding(format!(
        "not valid base64 ({} chars)",
        trimmed.len()
    )))
}

/// Encode bytes as padded standard base64.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Encode bytes as unpadded base64url (JOSE segments, status lists).
pub fn encode_base64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode a strict unpadded base64url segment, as used by compact JWTs.
pub fn decode_base64url(input: &str) -> Result<Vec<u8>, CryptoError> {
    URL_SAFE_NO_PAD
        .decode(input)
        .map_err(|e| CryptoError::Encoding(format!("invalid base64url: {e}")))
}

/// Decode a hex string, tolerating a `0x` prefix and surrounding whitespace.
pub fn decode_hex(input: &str) -> Result<Vec<u8>, CryptoError> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(digits).map_err(|e| CryptoError::Encoding(format!("invalid hex: {e}")))
}

/// Decode a multibase string.
///
/// Only base58btc (`z`) and base64 (`m`) are supported; any other prefix is
/// an error so callers fail closed.
pub fn decode_multibase(input: &str) -> Result<Vec<u8>, CryptoError> {
    let mut chars = input.chars();
    match chars.next() {
        Some(MULTIBASE_BASE58BTC) => bs58::decode(chars.as_str())
            .into_vec()
            .map_err(|e| CryptoError::Encoding(format!("invalid base58btc: {e}"))),
        Some(MULTIBASE_BASE64) => decode_base64(chars.as_str()),
        Some(other) => Err(CryptoError::Unsupported(format!(
            "multibase prefix {other:?}"
        ))),
        None => Err(CryptoError::Encoding("empty multibase string".into())),
    }
}

/// Encode bytes as a base58btc multibase string (`z...`).
pub fn encode_multibase_base58btc(bytes: &[u8]) -> String {
    format!("{MULTIBASE_BASE58BTC}{}", bs58::encode(bytes).into_string())
}
