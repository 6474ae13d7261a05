//! # DID Documents
//!
//! The subset of a DID Document the verifier needs: the `verificationMethod`
//! array and the five verification relationships. Relationship entries are
//! either embedded method objects or string references back into
//! `verificationMethod`, and ids may be absolute DID URLs or relative
//! `#fragment` references against the document `id`.
//!
//! Each method's key field is resolved once, at load time, into
//! [`KeyMaterial`]. Malformed entries in `verificationMethod` or a
//! relationship are skipped rather than failing the whole document.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use btco_crypto::{Jwk, KeyMaterial};

/// A resolved DID Document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    pub id: String,

    #[serde(default, deserialize_with = "well_formed_entries")]
    pub verification_method: Vec<VerificationMethod>,

    #[serde(default, deserialize_with = "well_formed_entries")]
    pub authentication: Vec<MethodEntry>,
    #[serde(default, deserialize_with = "well_formed_entries")]
    pub assertion_method: Vec<MethodEntry>,
    #[serde(default, deserialize_with = "well_formed_entries")]
    pub key_agreement: Vec<MethodEntry>,
    #[serde(default, deserialize_with = "well_formed_entries")]
    pub capability_invocation: Vec<MethodEntry>,
    #[serde(default, deserialize_with = "well_formed_entries")]
    pub capability_delegation: Vec<MethodEntry>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Keep the entries that parse as `T`. A lone object counts as a one-entry
/// array; `null` as an empty one.
fn well_formed_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let entries = match Value::deserialize(deserializer)? {
        Value::Array(entries) => entries,
        Value::Null => Vec::new(),
        single => vec![single],
    };
    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed verification method entry");
                None
            }
        })
        .collect())
}

/// An entry in a verification relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MethodEntry {
    Reference(String),
    Embedded(VerificationMethod),
}

/// A public key entry published in a DID Document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawVerificationMethod", into = "RawVerificationMethod")]
pub struct VerificationMethod {
    pub id: String,
    /// Key type tag, e.g. `Ed25519VerificationKey2020`.
    pub method_type: String,
    pub controller: Option<String>,
    /// `None` when no supported key field is present.
    pub key: Option<KeyMaterial>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVerificationMethod {
    id: String,
    #[serde(rename = "type", default)]
    method_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    controller: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    public_key_jwk: Option<Jwk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    public_key_multibase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    public_key_hex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    public_key_base64: Option<String>,
}

impl From<RawVerificationMethod> for VerificationMethod {
    fn from(raw: RawVerificationMethod) -> Self {
        Self {
            id: raw.id,
            method_type: raw.method_type,
            controller: raw.controller,
            key: KeyMaterial::select(
                raw.public_key_jwk,
                raw.public_key_multibase,
                raw.public_key_hex,
                raw.public_key_base64,
            ),
        }
    }
}

impl From<VerificationMethod> for RawVerificationMethod {
    fn from(vm: VerificationMethod) -> Self {
        let mut raw = Self {
            id: vm.id,
            method_type: vm.method_type,
            controller: vm.controller,
            public_key_jwk: None,
            public_key_multibase: None,
            public_key_hex: None,
            public_key_base64: None,
        };
        match vm.key {
            Some(KeyMaterial::Jwk(jwk)) => raw.public_key_jwk = Some(jwk),
            Some(KeyMaterial::Multibase(s)) => raw.public_key_multibase = Some(s),
            Some(KeyMaterial::Hex(s)) => raw.public_key_hex = Some(s),
            Some(KeyMaterial::Base64(s)) => raw.public_key_base64 = Some(s),
            None => {}
        }
        raw
    }
}

impl DidDocument {
    /// Find the method `reference` points at.
    ///
    /// Searches `verificationMethod` first, then embedded methods in each
    /// relationship. A string reference in a relationship only ever points
    /// back into `verificationMethod`, so it adds nothing to the search.
    pub fn find_verification_method(&self, reference: &str) -> Option<&VerificationMethod> {
        let target = self.absolute(reference);
        self.verification_method
            .iter()
            .chain(self.relationships().flat_map(|entries| {
                entries.iter().filter_map(|entry| match entry {
                    MethodEntry::Embedded(vm) => Some(vm),
                    MethodEntry::Reference(_) => None,
                })
            }))
            .find(|vm| self.absolute(&vm.id) == target)
    }

    fn relationships(&self) -> impl Iterator<Item = &Vec<MethodEntry>> {
        [
            &self.assertion_method,
            &self.authentication,
            &self.key_agreement,
            &self.capability_invocation,
            &self.capability_delegation,
        ]
        .into_iter()
    }

    fn absolute(&self, id: &str) -> String {
        if id.starts_with('#') {
            format!("{}{id}", self.id)
        } else {
            id.to_string()
        }
    }
}

/// Whether `value` is shaped like a DID Document (an object whose `id` is a
/// DID) rather than some other resolution content.
pub fn is_did_document(value: &Value) -> bool {
    value
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|id| id.starts_with("did:"))
}
