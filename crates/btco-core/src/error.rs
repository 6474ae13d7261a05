//! # Error Types — Shared Error Definitions
//!
//! Errors shared by every crate in the workspace. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations.

use thiserror::Error;

/// Machine-readable error codes carried by API-level failures.
///
/// These strings are part of the external contract: callers match on them,
/// so they never change once published.
pub mod codes {
    /// A credential failed cryptographic, temporal, or status verification.
    pub const VERIFICATION_FAILED: &str = "VERIFICATION_FAILED";
    /// Issuing a credential failed for any reason.
    pub const CREDENTIAL_ISSUANCE_ERROR: &str = "CREDENTIAL_ISSUANCE_ERROR";
    /// The upstream returned a body that does not match the expected shape.
    pub const INVALID_RESPONSE: &str = "INVALID_RESPONSE";
    /// The upstream rejected the request with a 4xx status.
    pub const HTTP_ERROR: &str = "HTTP_ERROR";
    /// A remote resource answered with something other than `200 OK`.
    pub const FETCH_FAILED: &str = "FETCH_FAILED";
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Validation failure for a domain newtype.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The string is not a `did:<method>:<id>` identifier.
    #[error("invalid DID: {0:?}")]
    InvalidDid(String),

    /// The string is not a DID URL (`did:<method>:<id>[/path][?query][#fragment]`).
    #[error("invalid DID URL: {0:?}")]
    InvalidDidUrl(String),
}
