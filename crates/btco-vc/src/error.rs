//! Error types for the credential layer.
//!
//! Verification never surfaces an `Err` to the public caller. Every internal
//! step returns `Result<(), VerificationFailure>`, and
//! [`CredentialVerifier::verify`](crate::CredentialVerifier::verify)
//! collapses the outcome to a `bool`. Issuance, resolution and storage fail
//! with ordinary error enums.

use thiserror::Error;

use btco_client::ClientError;
use btco_core::codes;

/// The verifier step at which a credential was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationStage {
    /// Missing `issuer` or `proof`, or an unusable issuer id.
    Structure,
    /// The issuer DID could not be resolved to a DID Document.
    IssuerResolution,
    /// The proof's verification method is not in the DID Document.
    MethodLookup,
    /// Signature decode or cryptographic check failed.
    Signature,
    /// `expirationDate` is in the past or unparsable.
    Expiration,
    /// The status entry reports the credential inactive, or could not be
    /// checked.
    Status,
}

impl std::fmt::Display for VerificationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Structure => "structure",
            Self::IssuerResolution => "issuer resolution",
            Self::MethodLookup => "verification method lookup",
            Self::Signature => "signature",
            Self::Expiration => "expiration",
            Self::Status => "status",
        };
        f.write_str(name)
    }
}

/// Why a credential did not verify.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage} check failed: {reason}")]
pub struct VerificationFailure {
    pub stage: VerificationStage,
    pub reason: String,
}

impl VerificationFailure {
    pub fn new(stage: VerificationStage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }

    /// Machine-readable code: always `VERIFICATION_FAILED`.
    pub fn code(&self) -> &'static str {
        codes::VERIFICATION_FAILED
    }
}

/// Errors from credential signing helpers.
#[derive(Error, Debug)]
pub enum VcError {
    /// Canonicalization of the credential body failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] btco_core::CanonicalizationError),

    /// Key or signature operation failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] btco_crypto::CryptoError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// DID resolution failures.
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// The resolver has no record of the DID.
    #[error("DID not found: {0}")]
    NotFound(String),

    /// Transport or upstream failure while resolving.
    #[error("resolver request failed: {0}")]
    Client(#[from] ClientError),

    /// The resolver answered with something that is not a resolution result.
    #[error("malformed resolution result: {0}")]
    Malformed(String),
}

/// Credential storage failures.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Credentials are keyed by `id`; one without it cannot be stored.
    #[error("credential has no id")]
    MissingId,

    /// Filesystem failure during backup or restore.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Issuance failures. Every variant reports `CREDENTIAL_ISSUANCE_ERROR`.
#[derive(Error, Debug)]
pub enum IssuanceError {
    /// The issuance API call failed, after retries.
    #[error("issuance API call failed: {0}")]
    Upstream(#[from] ClientError),

    /// The API returned a credential that does not verify against the
    /// issuer's own DID Document.
    #[error("issued credential failed self-verification: {0}")]
    SelfVerification(VerificationFailure),

    /// The draft could not be built, or the response is not a credential.
    #[error("credential draft error: {0}")]
    Draft(String),
}

impl IssuanceError {
    pub fn code(&self) -> &'static str {
        codes::CREDENTIAL_ISSUANCE_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_display_names_stage() {
        let f = VerificationFailure::new(VerificationStage::MethodLookup, "no such key");
        assert_eq!(f.to_string(), "verification method lookup check failed: no such key");
        assert_eq!(f.code(), "VERIFICATION_FAILED");
    }

    #[test]
    fn issuance_errors_share_one_code() {
        let e = IssuanceError::SelfVerification(VerificationFailure::new(
            VerificationStage::Signature,
            "bad",
        ));
        assert_eq!(e.code(), "CREDENTIAL_ISSUANCE_ERROR");
        assert_eq!(IssuanceError::Draft("x".into()).code(), "CREDENTIAL_ISSUANCE_ERROR");
    }
}
