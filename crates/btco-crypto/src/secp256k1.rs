//! # secp256k1 ECDSA Verification
//!
//! ECDSA over SHA-256 of the canonical message.
//!
//! ## Signature Encodings
//!
//! - **DER** (ASN.1 `SEQUENCE { r, s }`): the S value is normalized to the
//!   low-S form before verification, since `k256` rejects high-S signatures.
//! - **Raw** `r‖s`: accepted only when the bytes are not valid DER and are
//!   exactly 64 bytes long.
//!
//! Any other length, or any parse failure, is a verification failure.

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use zeroize::Zeroizing;

use btco_core::CanonicalBytes;

use crate::encoding::{decode_hex, encode_base64url, encode_multibase_base58btc};
use crate::error::CryptoError;
use crate::key::Jwk;
use crate::sha256::sha256_digest;

/// Multicodec prefix for a compressed secp256k1 public key (`0xe7` varint).
pub const MULTICODEC_SECP256K1_PUB: [u8; 2] = [0xe7, 0x01];

/// A secp256k1 public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Secp256k1PublicKey(VerifyingKey);

impl Secp256k1PublicKey {
    /// Parse a SEC1 point (33-byte compressed or 65-byte uncompressed).
    ///
    /// A multicodec-prefixed compressed key is accepted and the prefix
    /// stripped.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let raw = match bytes.len() {
            35 if bytes[..2] == MULTICODEC_SECP256K1_PUB => &bytes[2..],
            _ => bytes,
        };
        VerifyingKey::from_sec1_bytes(raw)
            .map(Self)
            .map_err(|e| CryptoError::KeyError(format!("invalid secp256k1 point: {e}")))
    }

    /// Build an uncompressed point `0x04‖x‖y` from JWK coordinates.
    pub fn from_coordinates(x: &[u8], y: &[u8]) -> Result<Self, CryptoError> {
        if x.len() != 32 || y.len() != 32 {
            return Err(CryptoError::KeyError(format!(
                "secp256k1 coordinates must be 32 bytes, got x={} y={}",
                x.len(),
                y.len()
            )));
        }
        let mut point = Vec::with_capacity(65);
        point.push(0x04);
        point.extend_from_slice(x);
        point.extend_from_slice(y);
        Self::from_sec1_bytes(&point)
    }

    /// The compressed SEC1 encoding (33 bytes).
    pub fn to_compressed(&self) -> Vec<u8> {
        self.0.to_encoded_point(true).as_bytes().to_vec()
    }

    /// Render as `publicKeyMultibase` (multicodec-prefixed, base58btc).
    pub fn to_multibase(&self) -> String {
        let mut prefixed = MULTICODEC_SECP256K1_PUB.to_vec();
        prefixed.extend_from_slice(&self.to_compressed());
        encode_multibase_base58btc(&prefixed)
    }

    /// Render as an `EC`/`secp256k1` public JWK.
    pub fn to_jwk(&self) -> Jwk {
        let point = self.0.to_encoded_point(false);
        let bytes = point.as_bytes();
        Jwk {
            kty: "EC".into(),
            crv: Some("secp256k1".into()),
            x: Some(encode_base64url(&bytes[1..33])),
            y: Some(encode_base64url(&bytes[33..65])),
            ..Jwk::default()
        }
    }

    /// Access the underlying `k256` verifying key.
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.0
    }
}

/// A secp256k1 key pair for producing DER-encoded proofs.
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    /// Generate a new random key pair.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    /// Restore a key pair from a hex-encoded 32-byte scalar.
    pub fn from_secret_hex(hex: &str) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(decode_hex(hex)?);
        let signing_key = SigningKey::from_slice(&bytes)
            .map_err(|e| CryptoError::KeyError(format!("invalid secp256k1 secret: {e}")))?;
        Ok(Self { signing_key })
    }

    /// Export the secret scalar as hex.
    pub fn to_secret_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.signing_key.to_bytes()))
    }

    /// The public half of this key pair.
    pub fn public_key(&self) -> Secp256k1PublicKey {
        Secp256k1PublicKey(self.signing_key.verifying_key().clone())
    }

    /// Sign canonical bytes, returning a low-S DER signature.
    pub fn sign(&self, data: &CanonicalBytes) -> Result<Vec<u8>, CryptoError> {
        let signature = self.sign_digest(&sha256_digest(data))?;
        Ok(signature.to_der().as_bytes().to_vec())
    }

    /// Sign a precomputed SHA-256 digest, returning raw `r‖s`.
    pub fn sign_digest_raw(&self, digest: &[u8; 32]) -> Result<[u8; 64], CryptoError> {
        let signature = self.sign_digest(digest)?;
        let mut raw = [0u8; 64];
        raw.copy_from_slice(&signature.to_bytes());
        Ok(raw)
    }

    fn sign_digest(&self, digest: &[u8; 32]) -> Result<Signature, CryptoError> {
        let signature: Signature = self
            .signing_key
            .sign_prehash(digest)
            .map_err(|e| CryptoError::KeyError(format!("secp256k1 signing failed: {e}")))?;
        Ok(signature)
    }
}

impl std::fmt::Debug for Secp256k1KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secp256k1KeyPair(<private>)")
    }
}

/// Verify a secp256k1 signature over the SHA-256 digest of canonical bytes.
pub fn verify(
    data: &CanonicalBytes,
    signature: &[u8],
    public_key: &Secp256k1PublicKey,
) -> Result<(), CryptoError> {
    verify_digest(&sha256_digest(data), signature, public_key)
}

/// Verify a DER or raw signature over a precomputed SHA-256 digest.
pub fn verify_digest(
    digest: &[u8; 32],
    signature: &[u8],
    public_key: &Secp256k1PublicKey,
) -> Result<(), CryptoError> {
    let signature = parse_signature(signature)?;
    public_key
        .0
        .verify_prehash(digest, &signature)
        .map_err(|e| CryptoError::VerificationFailed(format!("secp256k1 verification failed: {e}")))
}

fn parse_signature(bytes: &[u8]) -> Result<Signature, CryptoError> {
    match Signature::from_der(bytes) {
        Ok(sig) => Ok(sig.normalize_s().unwrap_or(sig)),
        Err(_) if bytes.len() == 64 => Signature::from_slice(bytes)
            .map_err(|e| CryptoError::VerificationFailed(format!("invalid r||s signature: {e}"))),
        Err(_) => Err(CryptoError::VerificationFailed(format!(
            "signature is neither DER nor 64-byte r||s ({} bytes)",
            bytes.len()
        ))),
    }
}
