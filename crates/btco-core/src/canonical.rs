//! # Canonical Serialization — JCS Byte Production
//!
//! This module defines `CanonicalBytes`, the sole construction path for bytes
//! used as a signing or verification message anywhere in the trust engine.
//!
//! ## Security Invariant
//!
//! The `CanonicalBytes` newtype has a private inner field. The only way to
//! construct it is through `CanonicalBytes::new()`, which serializes through
//! RFC 8785 (JSON Canonicalization Scheme): object keys sorted recursively by
//! UTF-16 code units, compact separators, ECMAScript number formatting.
//!
//! A signature produced by one party and checked by another only agrees if
//! both sides derive byte-identical messages. Any function that needs message
//! bytes accepts `&CanonicalBytes`, so the wrong serialization path cannot be
//! taken by accident.
//!
//! Credential documents legitimately carry fractional numbers, so unlike a
//! plain-integer policy the full JCS number grammar is accepted here.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
///
/// # Invariants
///
/// - The only constructor is `CanonicalBytes::new()`.
/// - Object keys are sorted at every nesting level.
/// - Serialization uses compact separators and no insignificant whitespace.
/// - Output is valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::SerializationFailed` if the value
    /// cannot be represented as JSON or JCS serialization fails.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        let bytes = serialize_canonical(&value)?;
        Ok(Self(bytes))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// View the canonical bytes as a string slice.
    pub fn as_str(&self) -> &str {
        // JCS output is produced from a Rust `String`.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn serialize_canonical(value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
    let s = serde_jcs::to_string(value)?;
    Ok(s.into_bytes())
}
