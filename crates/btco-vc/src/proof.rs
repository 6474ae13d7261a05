//! # Proof Types
//!
//! The cryptographic envelope attached to a credential. A proof's `type`
//! string selects the verification path:
//!
//! | `type`                                                              | Kind            |
//! |---------------------------------------------------------------------|-----------------|
//! | `DataIntegrityProof`, `Ed25519Signature2020`, `EcdsaSecp256k1Signature2019` | DataIntegrity |
//! | `JwtProof2020`, `JWT`                                               | Jwt             |
//! | `BbsBlsSignature2020`, `BBS`                                        | Bbs (fails closed) |
//!
//! Anything else is [`ProofKind::Unknown`] and never verifies.
//!
//! The type is kept as the original string so that canonicalization
//! reproduces exactly what the issuer signed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Proof type tag used by [`VerifiableCredential::sign_ed25519`](crate::VerifiableCredential::sign_ed25519)
/// and `sign_secp256k1`.
pub const DATA_INTEGRITY_PROOF: &str = "DataIntegrityProof";

/// Verification path selected by a proof's `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofKind {
    DataIntegrity,
    Jwt,
    Bbs,
    Unknown,
}

impl ProofKind {
    pub fn from_type(proof_type: &str) -> Self {
        match proof_type {
            "DataIntegrityProof" | "Ed25519Signature2020" | "EcdsaSecp256k1Signature2019" => {
                Self::DataIntegrity
            }
            "JwtProof2020" | "JWT" => Self::Jwt,
            "BbsBlsSignature2020" | "BBS" => Self::Bbs,
            _ => Self::Unknown,
        }
    }
}

/// A cryptographic proof on a Verifiable Credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    #[serde(rename = "type")]
    pub proof_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cryptosuite: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    /// DID URL of the signing key inside the issuer's DID Document.
    #[serde(
        rename = "verificationMethod",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub verification_method: Option<String>,

    #[serde(
        rename = "proofPurpose",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub proof_purpose: Option<String>,

    /// Base64 signature bytes (DataIntegrity) or a compact JWS (Jwt).
    #[serde(rename = "proofValue", default, skip_serializing_if = "Option::is_none")]
    pub proof_value: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Proof {
    /// An unsigned `DataIntegrityProof` for `assertionMethod`.
    pub fn data_integrity(verification_method: impl Into<String>, created: impl Into<String>) -> Self {
        Self {
            proof_type: DATA_INTEGRITY_PROOF.to_string(),
            cryptosuite: None,
            created: Some(created.into()),
            verification_method: Some(verification_method.into()),
            proof_purpose: Some("assertionMethod".to_string()),
            proof_value: None,
            extra: Map::new(),
        }
    }

    pub fn kind(&self) -> ProofKind {
        ProofKind::from_type(&self.proof_type)
    }
}

/// `proof` is either one object or an ordered array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProofSet {
    Single(Box<Proof>),
    Array(Vec<Proof>),
}

impl ProofSet {
    /// The proof selected for verification. Only the first entry of an
    /// array is ever checked.
    pub fn first(&self) -> Option<&Proof> {
        match self {
            Self::Single(p) => Some(p),
            Self::Array(arr) => arr.first(),
        }
    }

    pub fn first_mut(&mut self) -> Option<&mut Proof> {
        match self {
            Self::Single(p) => Some(p),
            Self::Array(arr) => arr.first_mut(),
        }
    }

    pub fn as_list(&self) -> Vec<&Proof> {
        match self {
            Self::Single(p) => vec![p.as_ref()],
            Self::Array(arr) => arr.iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(_) => false,
            Self::Array(arr) => arr.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_from_type() {
        assert_eq!(ProofKind::from_type("DataIntegrityProof"), ProofKind::DataIntegrity);
        assert_eq!(ProofKind::from_type("Ed25519Signature2020"), ProofKind::DataIntegrity);
        assert_eq!(ProofKind::from_type("JwtProof2020"), ProofKind::Jwt);
        assert_eq!(ProofKind::from_type("BbsBlsSignature2020"), ProofKind::Bbs);
        assert_eq!(ProofKind::from_type("RsaSignature2018"), ProofKind::Unknown);
    }

    #[test]
    fn unknown_proof_fields_are_preserved() {
        let raw = json!({
            "type": "DataIntegrityProof",
            "verificationMethod": "did:example:issuer#key-1",
            "proofValue": "abc",
            "challenge": "1234"
        });
        let proof: Proof = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(proof.extra["challenge"], "1234");
        assert_eq!(serde_json::to_value(&proof).unwrap(), raw);
    }

    #[test]
    fn proof_set_single_or_array() {
        let single: ProofSet = serde_json::from_value(json!({"type": "JWT"})).unwrap();
        assert_eq!(single.first().map(Proof::kind), Some(ProofKind::Jwt));

        let array: ProofSet =
            serde_json::from_value(json!([{"type": "BBS"}, {"type": "JWT"}])).unwrap();
        assert_eq!(array.as_list().len(), 2);
        assert_eq!(array.first().map(Proof::kind), Some(ProofKind::Bbs));

        let empty: ProofSet = serde_json::from_value(json!([])).unwrap();
        assert!(empty.is_empty());
        assert!(empty.first().is_none());
    }
}
