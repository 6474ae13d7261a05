//! # Credential Verifier
//!
//! Runs a credential through a fixed sequence of checks:
//!
//! ```text
//! Unchecked → StructureValid → IssuerResolved → MethodFound
//!           → SignatureValid → (not expired) → StatusChecked → Valid
//! ```
//!
//! The first failing step ends verification. There is no partial success:
//! [`CredentialVerifier::verify`] returns `false` and
//! [`CredentialVerifier::verify_detailed`] names the failing
//! [`VerificationStage`]. Resolver, network and decode errors are all
//! ordinary failures here and never propagate to the caller.
//!
//! Status-list credentials are verified by recursing into the same verifier
//! one level deeper. A credential at [`MAX_STATUS_DEPTH`] or deeper that
//! carries its own `credentialStatus` is rejected, which bounds the recursion
//! a hostile list can trigger.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;

use btco_client::ResourceFetcher;

use crate::credential::VerifiableCredential;
use crate::document::DidDocument;
use crate::error::{VerificationFailure, VerificationStage};
use crate::resolver::DidResolver;
use crate::signature::verify_proof;
use crate::status::{CredentialStatus, StatusListChecker};

/// Depth at which a credential may no longer carry a status entry.
pub const MAX_STATUS_DEPTH: u8 = 2;

type VerifyFuture<'a> = Pin<Box<dyn Future<Output = Result<(), VerificationFailure>> + Send + 'a>>;

/// Verifies credentials against their issuers' DID Documents.
pub struct CredentialVerifier {
    resolver: Arc<dyn DidResolver>,
    status: StatusListChecker,
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl CredentialVerifier {
    /// Status lists are fetched through `fetcher`, sharing its cache and
    /// breaker with whoever else holds it.
    pub fn new(resolver: Arc<dyn DidResolver>, fetcher: ResourceFetcher) -> Self {
        Self {
            resolver,
            status: StatusListChecker::new(fetcher),
        }
    }

    pub async fn verify(&self, credential: &VerifiableCredential) -> bool {
        self.verify_detailed(credential).await.is_ok()
    }

    /// Verify a credential given as raw JSON. Anything that does not parse
    /// as a credential is invalid.
    pub async fn verify_value(&self, credential: &Value) -> bool {
        match serde_json::from_value::<VerifiableCredential>(credential.clone()) {
            Ok(vc) => self.verify(&vc).await,
            Err(e) => {
                tracing::debug!(error = %e, "credential does not parse");
                false
            }
        }
    }

    pub async fn verify_detailed(&self, credential: &VerifiableCredential) -> Result<(), VerificationFailure> {
        let outcome = self.verify_at(credential, 0).await;
        if let Err(failure) = &outcome {
            tracing::debug!(
                credential = credential.id.as_deref().unwrap_or("<no id>"),
                stage = %failure.stage,
                reason = %failure.reason,
                "credential invalid"
            );
        }
        outcome
    }

    pub(crate) fn verify_at<'a>(&'a self, credential: &'a VerifiableCredential, depth: u8) -> VerifyFuture<'a> {
        Box::pin(async move {
            // Structure
            let issuer = credential
                .issuer_id()
                .filter(|id| !id.is_empty())
                .ok_or_else(|| VerificationFailure::new(VerificationStage::Structure, "credential has no issuer"))?;
            let proof = credential
                .first_proof()
                .ok_or_else(|| VerificationFailure::new(VerificationStage::Structure, "credential has no proof"))?;
            tracing::debug!(issuer, depth, "structure valid");

            let document = self.resolve_issuer(issuer).await?;
            tracing::debug!(issuer, "issuer resolved");

            let reference = proof.verification_method.as_deref().ok_or_else(|| {
                VerificationFailure::new(VerificationStage::MethodLookup, "proof has no verificationMethod")
            })?;
            let method = document.find_verification_method(reference).ok_or_else(|| {
                VerificationFailure::new(
                    VerificationStage::MethodLookup,
                    format!("{reference} is not in the DID Document of {issuer}"),
                )
            })?;
            tracing::debug!(method = %method.id, "verification method found");

            verify_proof(credential, proof, method)?;
            tracing::debug!(proof_type = %proof.proof_type, "signature valid");

            check_expiration(credential, Utc::now())?;

            if let Some(raw) = &credential.credential_status {
                if depth >= MAX_STATUS_DEPTH {
                    return Err(VerificationFailure::new(
                        VerificationStage::Status,
                        format!("status lists nest deeper than {MAX_STATUS_DEPTH} levels"),
                    ));
                }
                let status = CredentialStatus::from_value(raw);
                self.status.evaluate(&status, self, depth).await?;
                tracing::debug!("status checked");
            }
            Ok(())
        })
    }

    /// Resolve `did`, falling back to the document-only entry point when the
    /// general resolution returns other content.
    async fn resolve_issuer(&self, did: &str) -> Result<DidDocument, VerificationFailure> {
        let fail = |reason: String| VerificationFailure::new(VerificationStage::IssuerResolution, reason);

        let general = self
            .resolver
            .resolve(did)
            .await
            .map_err(|e| fail(format!("cannot resolve {did}: {e}")))?;
        if let Some(error) = &general.error {
            return Err(fail(format!("resolver reported {error} for {did}")));
        }
        let document = match general.document() {
            Some(doc) => doc.clone(),
            None => {
                tracing::debug!(
                    did,
                    content_type = general.content_type.as_deref().unwrap_or("<unknown>"),
                    "resolution returned non-document content; requesting DID Document"
                );
                let narrow = self
                    .resolver
                    .resolve_did_document(did)
                    .await
                    .map_err(|e| fail(format!("cannot resolve DID Document for {did}: {e}")))?;
                narrow
                    .document()
                    .cloned()
                    .ok_or_else(|| fail(format!("no DID Document available for {did}")))?
            }
        };
        serde_json::from_value(document).map_err(|e| fail(format!("malformed DID Document for {did}: {e}")))
    }
}

/// Reject a credential whose `expirationDate` is past `now`. An unparsable
/// date is rejected too.
fn check_expiration(credential: &VerifiableCredential, now: DateTime<Utc>) -> Result<(), VerificationFailure> {
    let Some(raw) = credential.expiration_date.as_deref() else {
        return Ok(());
    };
    let expires = parse_timestamp(raw).map_err(|e| {
        VerificationFailure::new(VerificationStage::Expiration, format!("invalid expirationDate {raw:?}: {e}"))
    })?;
    if expires < now {
        return Err(VerificationFailure::new(
            VerificationStage::Expiration,
            format!("expired at {raw}"),
        ));
    }
    Ok(())
}

/// RFC 3339, or an ISO 8601 date-time or date without offset read as UTC.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|rfc3339_err| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN)))
                .map(|t| t.and_utc())
                .map_err(|_| rfc3339_err)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn with_expiration(date: Option<&str>) -> VerifiableCredential {
        let mut vc: VerifiableCredential =
            serde_json::from_value(json!({"issuer": "did:example:issuer"})).unwrap();
        vc.expiration_date = date.map(str::to_string);
        vc
    }

    #[test]
    fn expiration_boundaries() {
        let now = DateTime::parse_from_rfc3339("2025-06-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert!(check_expiration(&with_expiration(None), now).is_ok());
        assert!(check_expiration(&with_expiration(Some("2025-06-01T00:00:01Z")), now).is_ok());
        assert!(check_expiration(&with_expiration(Some("2025-06-01T00:00:00Z")), now).is_ok());
        assert!(check_expiration(&with_expiration(Some("2025-05-31T23:59:59Z")), now).is_err());
        assert!(check_expiration(&with_expiration(Some("2025-06-02T02:00:00+03:00")), now).is_ok());

        // No offset: read as UTC.
        assert!(check_expiration(&with_expiration(Some("2999-01-01T00:00:00")), now).is_ok());
        assert!(check_expiration(&with_expiration(Some("2999-01-01")), now).is_ok());
        assert!(check_expiration(&with_expiration(Some("2025-06-01T00:00:00.5")), now).is_ok());
        assert!(check_expiration(&with_expiration(Some("2025-05-31T23:59:59")), now).is_err());
        assert!(check_expiration(&with_expiration(Some("2025-06-01")), now).is_ok());
        assert!(check_expiration(&with_expiration(Some("2025-05-31")), now).is_err());
    }

    #[test]
    fn unparsable_expiration_fails_closed() {
        let err = check_expiration(&with_expiration(Some("next tuesday")), Utc::now()).unwrap_err();
        assert_eq!(err.stage, VerificationStage::Expiration);
        assert!(check_expiration(&with_expiration(Some("2999-13-01")), Utc::now()).is_err());
    }
}
