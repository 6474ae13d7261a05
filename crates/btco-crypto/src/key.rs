//! # Verification Method Key Material
//!
//! A DID Document verification method publishes its key in one of four
//! fields. The field is resolved once, when the document is loaded, into the
//! [`KeyMaterial`] tagged union; each signature scheme then performs a single
//! exhaustive match to obtain its key type.
//!
//! | Field                | Variant                   |
//! |----------------------|---------------------------|
//! | `publicKeyJwk`       | [`KeyMaterial::Jwk`]       |
//! | `publicKeyMultibase` | [`KeyMaterial::Multibase`] |
//! | `publicKeyHex`       | [`KeyMaterial::Hex`]       |
//! | `publicKeyBase64`    | [`KeyMaterial::Base64`]    |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ed25519::Ed25519PublicKey;
use crate::encoding::{decode_base64, decode_base64url, decode_hex, decode_multibase, MULTIBASE_BASE58BTC};
use crate::error::CryptoError;
use crate::secp256k1::Secp256k1PublicKey;

/// A JSON Web Key (RFC 7517) as published in `publicKeyJwk`.
///
/// Only the public parameters used for verification are modelled; every
/// other member is preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type: `EC`, `OKP`, `RSA`.
    pub kty: String,
    /// Curve name for `EC`/`OKP` keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// X coordinate (EC) or public key (OKP), base64url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// Y coordinate (EC), base64url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    /// RSA modulus, base64url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA exponent, base64url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    /// Intended algorithm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Jwk {
    /// True for `EC` keys on secp256k1 (`secp256k1` or the legacy `P-256K`).
    pub fn is_secp256k1(&self) -> bool {
        self.kty == "EC" && matches!(self.crv.as_deref(), Some("secp256k1") | Some("P-256K"))
    }

    /// True for `OKP` keys on Ed25519.
    pub fn is_ed25519(&self) -> bool {
        self.kty == "OKP" && self.crv.as_deref() == Some("Ed25519")
    }

    fn coordinate(&self, value: &Option<String>, name: &str) -> Result<Vec<u8>, CryptoError> {
        let encoded = value
            .as_deref()
            .ok_or_else(|| CryptoError::KeyError(format!("JWK is missing '{name}'")))?;
        decode_base64url(encoded)
    }
}

/// Public key material from exactly one verification method field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    /// `publicKeyJwk`.
    Jwk(Jwk),
    /// `publicKeyMultibase`.
    Multibase(String),
    /// `publicKeyHex`.
    Hex(String),
    /// `publicKeyBase64`.
    Base64(String),
}

impl KeyMaterial {
    /// Pick the key field to use when a document lists more than one.
    ///
    /// Priority: JWK, multibase, hex, base64. Returns `None` when no field is
    /// present; verification against such a method fails closed.
    pub fn select(
        jwk: Option<Jwk>,
        multibase: Option<String>,
        hex: Option<String>,
        base64: Option<String>,
    ) -> Option<Self> {
        jwk.map(Self::Jwk)
            .or_else(|| multibase.map(Self::Multibase))
            .or_else(|| hex.map(Self::Hex))
            .or_else(|| base64.map(Self::Base64))
    }

    /// The DID Document field this material was read from.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Jwk(_) => "publicKeyJwk",
            Self::Multibase(_) => "publicKeyMultibase",
            Self::Hex(_) => "publicKeyHex",
            Self::Base64(_) => "publicKeyBase64",
        }
    }

    /// The JWK, if this material is one.
    pub fn as_jwk(&self) -> Option<&Jwk> {
        match self {
            Self::Jwk(jwk) => Some(jwk),
            _ => None,
        }
    }

    /// Decode an Ed25519 public key.
    ///
    /// Multibase accepts `z` (base58btc) and `m` (base64); a JWK must be an
    /// `OKP`/`Ed25519` key.
    pub fn ed25519_public_key(&self) -> Result<Ed25519PublicKey, CryptoError> {
        let bytes = match self {
            Self::Multibase(s) => decode_multibase(s)?,
            Self::Hex(s) => decode_hex(s)?,
            Self::Base64(s) => decode_base64(s)?,
            Self::Jwk(jwk) if jwk.is_ed25519() => jwk.coordinate(&jwk.x, "x")?,
            Self::Jwk(jwk) => {
                return Err(CryptoError::KeyError(format!(
                    "JWK kty={} crv={:?} is not an Ed25519 key",
                    jwk.kty, jwk.crv
                )))
            }
        };
        Ed25519PublicKey::from_slice(&bytes)
    }

    /// Decode a secp256k1 public key.
    ///
    /// A JWK must be `EC` on `secp256k1`/`P-256K`; multibase must be
    /// base58btc.
    pub fn secp256k1_public_key(&self) -> Result<Secp256k1PublicKey, CryptoError> {
        match self {
            Self::Jwk(jwk) if jwk.is_secp256k1() => {
                let x = jwk.coordinate(&jwk.x, "x")?;
                let y = jwk.coordinate(&jwk.y, "y")?;
                Secp256k1PublicKey::from_coordinates(&x, &y)
            }
            Self::Jwk(jwk) => Err(CryptoError::KeyError(format!(
                "JWK kty={} crv={:?} is not a secp256k1 key",
                jwk.kty, jwk.crv
            ))),
            Self::Multibase(s) if s.starts_with(MULTIBASE_BASE58BTC) => {
                Secp256k1PublicKey::from_sec1_bytes(&decode_multibase(s)?)
            }
            Self::Multibase(_) => Err(CryptoError::Unsupported(
                "secp256k1 multibase keys must be base58btc".into(),
            )),
            Self::Hex(s) => Secp256k1PublicKey::from_sec1_bytes(&decode_hex(s)?),
            Self::Base64(s) => Secp256k1PublicKey::from_sec1_bytes(&decode_base64(s)?),
        }
    }
}
