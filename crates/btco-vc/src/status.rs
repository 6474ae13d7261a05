//! # Credential Status Lists
//!
//! Bitstring revocation lists in two formats:
//!
//! | Entry type                 | List location                         | Encoding            |
//! |----------------------------|---------------------------------------|---------------------|
//! | `RevocationList2020Status` | `id`, optionally wrapped by `revocationListCredential` | base64 |
//! | `StatusList2021Entry`      | `statusListCredential` subject        | base64url + gzip    |
//!
//! Bit `i` is bit `7 - (i mod 8)` of byte `i / 8` (most significant bit
//! first). An index past the end of the list fails closed.
//!
//! ## Security Invariant
//!
//! Every malformed, missing or unreachable input fails closed, with one
//! exception: an unrecognized status `type` is treated as active. That path
//! logs a warning on every hit.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;
use thiserror::Error;

use btco_client::ResourceFetcher;
use btco_crypto::encoding::{decode_base64, encode_base64, encode_base64url};
use btco_crypto::CryptoError;

use crate::credential::VerifiableCredential;
use crate::error::{VerificationFailure, VerificationStage};
use crate::verifier::CredentialVerifier;

pub const REVOCATION_LIST_2020_STATUS: &str = "RevocationList2020Status";
pub const STATUS_LIST_2021_ENTRY: &str = "StatusList2021Entry";

/// Upper bound on an inflated StatusList2021 bitstring.
pub const MAX_INFLATED_LEN: usize = 16 * 1024 * 1024;

/// Bitstring encode/decode failures.
#[derive(Error, Debug)]
pub enum StatusError {
    #[error("invalid list encoding: {0}")]
    Encoding(#[from] CryptoError),

    #[error("gzip error: {0}")]
    Gzip(#[from] std::io::Error),

    #[error("inflated list exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("index {index} is outside a list of {len} bits")]
    IndexOutOfRange { index: u64, len: usize },
}

/// A revocation bitstring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitstring {
    bytes: Vec<u8>,
}

impl Bitstring {
    /// An all-clear list holding at least `len_bits` bits.
    pub fn new(len_bits: usize) -> Self {
        Self {
            bytes: vec![0; len_bits.div_ceil(8)],
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length in bits.
    pub fn len(&self) -> usize {
        self.bytes.len() * 8
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The bit at `index`, or `None` past the end.
    pub fn get(&self, index: u64) -> Option<bool> {
        let byte = usize::try_from(index / 8).ok()?;
        let mask = 0x80u8 >> (index % 8);
        self.bytes.get(byte).map(|b| b & mask != 0)
    }

    pub fn set(&mut self, index: u64, value: bool) -> Result<(), StatusError> {
        let len = self.len();
        let slot = usize::try_from(index / 8)
            .ok()
            .and_then(|byte| self.bytes.get_mut(byte))
            .ok_or(StatusError::IndexOutOfRange { index, len })?;
        let mask = 0x80u8 >> (index % 8);
        if value {
            *slot |= mask;
        } else {
            *slot &= !mask;
        }
        Ok(())
    }

    /// Decode a RevocationList2020 `encodedList` (base64, any alphabet).
    pub fn decode_base64(encoded: &str) -> Result<Self, StatusError> {
        Ok(Self::from_bytes(decode_base64(encoded)?))
    }

    /// Decode a StatusList2021 `encodedList` (base64url over gzip).
    pub fn decode_gzip_base64url(encoded: &str) -> Result<Self, StatusError> {
        let compressed = decode_base64(encoded)?;
        let mut inflated = Vec::new();
        GzDecoder::new(compressed.as_slice())
            .take(MAX_INFLATED_LEN as u64 + 1)
            .read_to_end(&mut inflated)?;
        if inflated.len() > MAX_INFLATED_LEN {
            return Err(StatusError::TooLarge {
                limit: MAX_INFLATED_LEN,
            });
        }
        Ok(Self::from_bytes(inflated))
    }

    pub fn encode_base64(&self) -> String {
        encode_base64(&self.bytes)
    }

    pub fn encode_gzip_base64url(&self) -> Result<String, StatusError> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.bytes)?;
        Ok(encode_base64url(&encoder.finish()?))
    }
}

/// A parsed `credentialStatus` entry. Missing or malformed fields are kept
/// as `None` and fail closed when checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialStatus {
    RevocationList2020 {
        list_url: Option<String>,
        index: Option<u64>,
        list_credential: Option<String>,
    },
    StatusList2021 {
        list_credential: Option<String>,
        index: Option<u64>,
        purpose: Option<String>,
    },
    Unknown {
        status_type: Option<String>,
    },
}

impl CredentialStatus {
    pub fn from_value(value: &Value) -> Self {
        let text = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);
        match value.get("type").and_then(Value::as_str) {
            Some(REVOCATION_LIST_2020_STATUS) => Self::RevocationList2020 {
                list_url: text("id"),
                index: parse_index(value.get("revocationListIndex")),
                list_credential: text("revocationListCredential"),
            },
            Some(STATUS_LIST_2021_ENTRY) => Self::StatusList2021 {
                list_credential: text("statusListCredential"),
                index: parse_index(value.get("statusListIndex")),
                purpose: text("statusPurpose"),
            },
            other => Self::Unknown {
                status_type: other.map(str::to_string),
            },
        }
    }
}

/// Indices appear both as JSON numbers and as decimal strings. Negative or
/// fractional values are rejected.
fn parse_index(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn fail(reason: impl Into<String>) -> VerificationFailure {
    VerificationFailure::new(VerificationStage::Status, reason)
}

fn encoded_list(document: &Value) -> Option<&str> {
    document
        .get("encodedList")
        .or_else(|| document.get("credentialSubject")?.get("encodedList"))
        .and_then(Value::as_str)
}

/// Fetches, authenticates and decodes status lists.
#[derive(Debug, Clone)]
pub struct StatusListChecker {
    fetcher: ResourceFetcher,
}

impl StatusListChecker {
    pub fn new(fetcher: ResourceFetcher) -> Self {
        Self { fetcher }
    }

    /// `true` when the credential is currently active per `status`.
    pub async fn check(&self, status: &CredentialStatus, verifier: &CredentialVerifier, depth: u8) -> bool {
        self.evaluate(status, verifier, depth).await.is_ok()
    }

    /// As [`check`](Self::check), with the reason on failure. Wrapping list
    /// credentials are verified at `depth + 1`.
    pub async fn evaluate(
        &self,
        status: &CredentialStatus,
        verifier: &CredentialVerifier,
        depth: u8,
    ) -> Result<(), VerificationFailure> {
        match status {
            CredentialStatus::RevocationList2020 {
                list_url,
                index,
                list_credential,
            } => {
                let url = list_url.as_deref().ok_or_else(|| fail("status entry has no list id"))?;
                let index = index.ok_or_else(|| fail("missing or invalid revocationListIndex"))?;
                let list = self
                    .fetcher
                    .fetch_json(url)
                    .await
                    .map_err(|e| fail(format!("cannot fetch revocation list: {e}")))?;
                if let Some(wrapper) = list_credential {
                    self.verified_list_credential(wrapper, verifier, depth).await?;
                }
                let encoded = encoded_list(&list).ok_or_else(|| fail("revocation list has no encodedList"))?;
                let bits = Bitstring::decode_base64(encoded).map_err(|e| fail(e.to_string()))?;
                match bits.get(index) {
                    Some(false) => Ok(()),
                    Some(true) => Err(fail(format!("revoked at index {index}"))),
                    None => Err(fail(StatusError::IndexOutOfRange { index, len: bits.len() }.to_string())),
                }
            }
            CredentialStatus::StatusList2021 {
                list_credential,
                index,
                purpose,
            } => {
                let url = list_credential
                    .as_deref()
                    .ok_or_else(|| fail("status entry has no statusListCredential"))?;
                let index = index.ok_or_else(|| fail("missing or invalid statusListIndex"))?;
                let list = self.verified_list_credential(url, verifier, depth).await?;
                let encoded = list
                    .credential_subject
                    .get("encodedList")
                    .and_then(Value::as_str)
                    .ok_or_else(|| fail("status list credential has no encodedList"))?;
                let bits = Bitstring::decode_gzip_base64url(encoded).map_err(|e| fail(e.to_string()))?;
                let set = bits.get(index).ok_or_else(|| {
                    fail(StatusError::IndexOutOfRange { index, len: bits.len() }.to_string())
                })?;
                match (purpose.as_deref(), set) {
                    (Some(p @ ("revocation" | "suspension")), true) => {
                        Err(fail(format!("{p} bit set at index {index}")))
                    }
                    (Some("revocation" | "suspension"), false) => Ok(()),
                    (_, true) => Ok(()),
                    (_, false) => Err(fail(format!("status bit clear at index {index}"))),
                }
            }
            CredentialStatus::Unknown { status_type } => {
                tracing::warn!(
                    status_type = status_type.as_deref().unwrap_or("<none>"),
                    "unrecognized credentialStatus type; treating credential as active"
                );
                Ok(())
            }
        }
    }

    async fn verified_list_credential(
        &self,
        url: &str,
        verifier: &CredentialVerifier,
        depth: u8,
    ) -> Result<VerifiableCredential, VerificationFailure> {
        let document = self
            .fetcher
            .fetch_json(url)
            .await
            .map_err(|e| fail(format!("cannot fetch status list credential: {e}")))?;
        let credential: VerifiableCredential = serde_json::from_value(document.as_ref().clone())
            .map_err(|e| fail(format!("status list credential is malformed: {e}")))?;
        verifier
            .verify_at(&credential, depth + 1)
            .await
            .map_err(|e| fail(format!("status list credential {url} does not verify: {e}")))?;
        Ok(credential)
    }
}
