//! Error type shared by every primitive in this crate.

use thiserror::Error;

/// Error in cryptographic decoding or verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Signature verification failed.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Key parsing or conversion failed.
    #[error("key error: {0}")]
    KeyError(String),

    /// A base58/base64/hex/multibase payload could not be decoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The scheme or encoding is recognized but not supported.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A compact JWT was malformed or its claims were rejected.
    #[error("JWT rejected: {0}")]
    Jwt(String),
}
