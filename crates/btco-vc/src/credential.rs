//! # Verifiable Credential Structure and Signing
//!
//! [`VerifiableCredential`] follows the W3C VC Data Model. Known fields are
//! typed; every other top-level member is carried in `extra` so that a
//! credential received from an issuer re-serializes to the same canonical
//! bytes it was signed over.
//!
//! ## Signing Input
//!
//! The message a Data Integrity proof signs is the JCS canonicalization
//! ([`CanonicalBytes`]) of the whole credential, `proof` included, with the
//! `proofValue` member removed from every proof object. All other proof
//! members (`type`, `created`, `verificationMethod`, `proofPurpose`) are
//! covered by the signature.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use btco_core::CanonicalBytes;
use btco_crypto::encoding::encode_base64;
use btco_crypto::{Ed25519KeyPair, Secp256k1KeyPair};

use crate::error::VcError;
use crate::proof::{Proof, ProofSet};

/// W3C credentials v1 context.
pub const CREDENTIALS_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// A W3C Verifiable Credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiableCredential {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub credential_type: Option<CredentialTypeValue>,

    /// Issuer DID, either bare or as an object with `id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Issuer>,

    /// ISO 8601 timestamp, kept verbatim.
    #[serde(rename = "issuanceDate", default, skip_serializing_if = "Option::is_none")]
    pub issuance_date: Option<String>,

    /// ISO 8601 timestamp, kept verbatim and parsed at verification time.
    #[serde(rename = "expirationDate", default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,

    #[serde(rename = "credentialSubject", default, skip_serializing_if = "Value::is_null")]
    pub credential_subject: Value,

    /// Raw status entry; interpreted by
    /// [`CredentialStatus::from_value`](crate::CredentialStatus::from_value).
    #[serde(rename = "credentialStatus", default, skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<ProofSet>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// JSON-LD `@context`: a single URI or an array of URIs and objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Single(String),
    Array(Vec<Value>),
}

/// Credential `type`: one string or an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CredentialTypeValue {
    Single(String),
    Array(Vec<String>),
}

impl CredentialTypeValue {
    pub fn contains(&self, name: &str) -> bool {
        match self {
            Self::Single(s) => s == name,
            Self::Array(arr) => arr.iter().any(|s| s == name),
        }
    }
}

/// `issuer`: a DID string, or an object whose `id` is the DID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Issuer {
    Id(String),
    Object(IssuerObject),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuerObject {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Issuer {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Object(obj) => &obj.id,
        }
    }
}

impl VerifiableCredential {
    /// The issuer DID string, if an issuer is present.
    pub fn issuer_id(&self) -> Option<&str> {
        self.issuer.as_ref().map(Issuer::id)
    }

    /// `credentialSubject.id`, when the subject is a single object.
    pub fn subject_id(&self) -> Option<&str> {
        self.credential_subject.get("id").and_then(Value::as_str)
    }

    /// The proof selected for verification.
    pub fn first_proof(&self) -> Option<&Proof> {
        self.proof.as_ref().and_then(ProofSet::first)
    }

    /// Compute the canonical message covered by Data Integrity proofs.
    pub fn signing_input(&self) -> Result<CanonicalBytes, VcError> {
        let mut value = serde_json::to_value(self)?;
        if let Some(proof) = value.get_mut("proof") {
            strip_proof_values(proof);
        }
        Ok(CanonicalBytes::new(&value)?)
    }

    /// Sign with Ed25519, replacing any existing proof with a
    /// `DataIntegrityProof` whose `proofValue` is the base64 signature.
    pub fn sign_ed25519(
        &mut self,
        key: &Ed25519KeyPair,
        verification_method: &str,
        created: Option<DateTime<Utc>>,
    ) -> Result<(), VcError> {
        let message = self.prepare_proof(verification_method, created)?;
        let signature = key.sign(&message);
        self.set_proof_value(encode_base64(signature.as_bytes()));
        Ok(())
    }

    /// Sign with secp256k1 (ECDSA over SHA-256, DER encoded), replacing any
    /// existing proof.
    pub fn sign_secp256k1(
        &mut self,
        key: &Secp256k1KeyPair,
        verification_method: &str,
        created: Option<DateTime<Utc>>,
    ) -> Result<(), VcError> {
        let message = self.prepare_proof(verification_method, created)?;
        let signature = key.sign(&message)?;
        self.set_proof_value(encode_base64(&signature));
        Ok(())
    }

    fn prepare_proof(
        &mut self,
        verification_method: &str,
        created: Option<DateTime<Utc>>,
    ) -> Result<CanonicalBytes, VcError> {
        let created = created
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        self.proof = Some(ProofSet::Single(Box::new(Proof::data_integrity(
            verification_method,
            created,
        ))));
        self.signing_input()
    }

    fn set_proof_value(&mut self, value: String) {
        if let Some(proof) = self.proof.as_mut().and_then(ProofSet::first_mut) {
            proof.proof_value = Some(value);
        }
    }
}

fn strip_proof_values(proof: &mut Value) {
    match proof {
        Value::Object(obj) => {
            obj.remove("proofValue");
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                if let Value::Object(obj) = item {
                    obj.remove("proofValue");
                }
            }
        }
        _ => {}
    }
}
