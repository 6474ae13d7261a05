//! # SHA-256 Digest Computation
//!
//! Digests are computed exclusively from `CanonicalBytes`, so a secp256k1
//! message hash can only be taken over the canonical signing input.

use btco_core::CanonicalBytes;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> [u8; 32] {
    Sha256::digest(data.as_bytes()).into()
}

/// Compute a lowercase hex SHA-256 digest of canonical bytes.
pub fn sha256_hex(data: &CanonicalBytes) -> String {
    hex::encode(sha256_digest(data))
}
