//! # Credential Issuer
//!
//! Issuance is draft → sign → self-verify → store:
//!
//! 1. Build an unsigned credential for the subject from its metadata and
//!    content description.
//! 2. Submit it with the issuer DID to the issuance API, which signs it.
//! 3. Verify the returned credential against the issuer's published DID
//!    Document. A credential that does not verify is rejected even though
//!    the API call succeeded.
//! 4. Hand it to the repository. Storage failure is logged and does not
//!    fail issuance.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use btco_client::IssuanceApiClient;
use btco_core::Did;

use crate::credential::{ContextValue, CredentialTypeValue, Issuer, VerifiableCredential, CREDENTIALS_V1_CONTEXT};
use crate::error::IssuanceError;
use crate::repository::{CredentialMetadata, CredentialRepository};
use crate::verifier::CredentialVerifier;

pub const DATA_INTEGRITY_V2_CONTEXT: &str = "https://w3id.org/security/data-integrity/v2";
pub const VERIFIABLE_COLLECTIBLE_TYPE: &str = "VerifiableCollectible";

/// Description of the inscribed content a credential is about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentInfo {
    pub mime_type: String,
    /// Hex SHA-256 of the content.
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueParams {
    pub subject_did: Did,
    pub issuer_did: Did,
    pub metadata: CredentialMetadata,
    pub content_info: ContentInfo,
}

/// Build the unsigned credential submitted for signing.
pub fn build_draft(params: &IssueParams, now: DateTime<Utc>) -> Result<VerifiableCredential, IssuanceError> {
    let meta = &params.metadata;
    let content = serde_json::to_value(&params.content_info)
        .map_err(|e| IssuanceError::Draft(format!("cannot encode content info: {e}")))?;

    let mut subject = Map::new();
    subject.insert("id".into(), json!(params.subject_did.as_str()));
    subject.insert("type".into(), json!("Collectible"));
    subject.insert("inscriptionId".into(), json!(meta.inscription_id));
    subject.insert("title".into(), json!(meta.title));
    subject.insert("creator".into(), json!(meta.creator));
    if let Some(description) = &meta.description {
        subject.insert("description".into(), json!(description));
    }
    if !meta.attributes.is_empty() {
        subject.insert("attributes".into(), Value::Object(meta.attributes.clone()));
    }
    subject.insert("content".into(), content);

    Ok(VerifiableCredential {
        context: Some(ContextValue::Array(vec![
            json!(CREDENTIALS_V1_CONTEXT),
            json!(DATA_INTEGRITY_V2_CONTEXT),
        ])),
        id: Some(format!("urn:uuid:{}", Uuid::new_v4())),
        credential_type: Some(CredentialTypeValue::Array(vec![
            "VerifiableCredential".into(),
            VERIFIABLE_COLLECTIBLE_TYPE.into(),
        ])),
        issuer: Some(Issuer::Id(params.issuer_did.to_string())),
        issuance_date: Some(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
        expiration_date: None,
        credential_subject: Value::Object(subject),
        credential_status: None,
        proof: None,
        extra: Map::new(),
    })
}

/// Issues credentials through the external issuance API.
pub struct CredentialIssuer {
    api: IssuanceApiClient,
    verifier: Arc<CredentialVerifier>,
    repository: Arc<dyn CredentialRepository>,
}

impl std::fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialIssuer")
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

impl CredentialIssuer {
    pub fn new(
        api: IssuanceApiClient,
        verifier: Arc<CredentialVerifier>,
        repository: Arc<dyn CredentialRepository>,
    ) -> Self {
        Self {
            api,
            verifier,
            repository,
        }
    }

    /// Issue a credential.
    ///
    /// # Errors
    ///
    /// Every failure is an [`IssuanceError`] with code
    /// `CREDENTIAL_ISSUANCE_ERROR`, wrapping the API error, the
    /// self-verification failure, or the malformed response.
    pub async fn issue(&self, params: &IssueParams) -> Result<VerifiableCredential, IssuanceError> {
        let draft = build_draft(params, Utc::now())?;
        let body = serde_json::to_value(&draft)
            .map_err(|e| IssuanceError::Draft(format!("cannot encode draft: {e}")))?;

        let signed = self.api.issue_credential(&body, &params.issuer_did).await?;
        let credential: VerifiableCredential = serde_json::from_value(signed)
            .map_err(|e| IssuanceError::Draft(format!("issuance API returned a malformed credential: {e}")))?;

        if let Err(failure) = self.verifier.verify_detailed(&credential).await {
            tracing::warn!(
                issuer = %params.issuer_did,
                stage = %failure.stage,
                reason = %failure.reason,
                "issued credential failed self-verification"
            );
            return Err(IssuanceError::SelfVerification(failure));
        }

        if let Err(e) = self.repository.store_credential(&credential, &params.metadata).await {
            tracing::warn!(
                credential = credential.id.as_deref().unwrap_or("<no id>"),
                error = %e,
                "issued credential could not be stored"
            );
        }

        tracing::info!(
            credential = credential.id.as_deref().unwrap_or("<no id>"),
            issuer = %params.issuer_did,
            subject = %params.subject_did,
            "credential issued"
        );
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> IssueParams {
        IssueParams {
            subject_did: Did::new("did:btco:123/0").unwrap(),
            issuer_did: Did::new("did:example:issuer").unwrap(),
            metadata: CredentialMetadata {
                inscription_id: "abc123i0".into(),
                title: "Genesis".into(),
                creator: "did:btco:1".into(),
                description: Some("first".into()),
                ..Default::default()
            },
            content_info: ContentInfo {
                mime_type: "image/png".into(),
                hash: "00".repeat(32),
                size: Some(1024),
                url: None,
            },
        }
    }

    #[test]
    fn draft_shape() {
        let now = DateTime::parse_from_rfc3339("2025-01-02T03:04:05Z").unwrap().with_timezone(&Utc);
        let vc = build_draft(&params(), now).unwrap();
        let v = serde_json::to_value(&vc).unwrap();

        assert_eq!(v["@context"][0], CREDENTIALS_V1_CONTEXT);
        assert_eq!(v["type"][1], "VerifiableCollectible");
        assert_eq!(v["issuer"], "did:example:issuer");
        assert_eq!(v["issuanceDate"], "2025-01-02T03:04:05Z");
        assert_eq!(v["credentialSubject"]["id"], "did:btco:123/0");
        assert_eq!(v["credentialSubject"]["inscriptionId"], "abc123i0");
        assert_eq!(v["credentialSubject"]["content"]["mimeType"], "image/png");
        assert_eq!(v["credentialSubject"]["content"]["size"], 1024);
        assert!(v["credentialSubject"]["content"].get("url").is_none());
        assert!(v.get("proof").is_none());
        assert!(vc.id.as_deref().unwrap().starts_with("urn:uuid:"));
    }

    #[test]
    fn drafts_get_distinct_ids() {
        let now = Utc::now();
        let a = build_draft(&params(), now).unwrap();
        let b = build_draft(&params(), now).unwrap();
        assert_ne!(a.id, b.id);
    }
}
