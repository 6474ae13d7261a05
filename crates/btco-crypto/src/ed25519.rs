//! # Ed25519 Signing and Verification
//!
//! Ed25519 verification for Data Integrity proofs, plus key generation and
//! signing used to produce such proofs.
//!
//! ## Security Invariant
//!
//! - The message is always `&CanonicalBytes`. The raw signature is checked
//!   against those bytes directly, with no pre-hash.
//! - Private keys are never serialized or logged. `Ed25519KeyPair` does not
//!   implement `Serialize`; its seed is only exported wrapped in `Zeroizing`.
//!
//! ## Serde
//!
//! Public keys and signatures serialize as lowercase hex strings.

use ed25519_dalek::Signer;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

use btco_core::CanonicalBytes;

use crate::encoding::{decode_hex, encode_multibase_base58btc};
use crate::error::CryptoError;

/// Multicodec prefix for an Ed25519 public key (`0xed` varint).
pub const MULTICODEC_ED25519_PUB: [u8; 2] = [0xed, 0x01];

/// An Ed25519 public key (32 bytes).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey(pub [u8; 32]);

/// An Ed25519 signature (64 bytes).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ed25519Signature(pub [u8; 64]);

/// An Ed25519 key pair for signing operations.
pub struct Ed25519KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

// ---------------------------------------------------------------------------
// Ed25519PublicKey impls
// ---------------------------------------------------------------------------

impl Ed25519PublicKey {
    /// Create a public key from raw 32 bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a public key from a decoded byte slice.
    ///
    /// A 34-byte slice carrying the Ed25519 multicodec prefix is accepted
    /// and the prefix stripped.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let raw = match bytes.len() {
            34 if bytes[..2] == MULTICODEC_ED25519_PUB => &bytes[2..],
            _ => bytes,
        };
        let arr: [u8; 32] = raw.try_into().map_err(|_| {
            CryptoError::KeyError(format!(
                "Ed25519 public key must be 32 bytes, got {}",
                raw.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Return the raw 32-byte public key.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the public key as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a public key from a hex string.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        Self::from_slice(&decode_hex(hex)?)
    }

    /// Render as `publicKeyMultibase` (multicodec-prefixed, base58btc).
    pub fn to_multibase(&self) -> String {
        let mut prefixed = Vec::with_capacity(34);
        prefixed.extend_from_slice(&MULTICODEC_ED25519_PUB);
        prefixed.extend_from_slice(&self.0);
        encode_multibase_base58btc(&prefixed)
    }

    /// Convert to an `ed25519_dalek::VerifyingKey`.
    pub fn to_verifying_key(&self) -> Result<ed25519_dalek::VerifyingKey, CryptoError> {
        ed25519_dalek::VerifyingKey::from_bytes(&self.0)
            .map_err(|e| CryptoError::KeyError(format!("invalid Ed25519 public key: {e}")))
    }
}

impl Serialize for Ed25519PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519PublicKey({}...)", hex::encode(&self.0[..4]))
    }
}

impl std::fmt::Display for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Ed25519Signature impls
// ---------------------------------------------------------------------------

impl Ed25519Signature {
    /// Create a signature from raw 64 bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Create a signature from a decoded byte slice of exactly 64 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 64] = bytes.try_into().map_err(|_| {
            CryptoError::VerificationFailed(format!(
                "Ed25519 signature must be 64 bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Return the raw 64-byte signature.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Render the signature as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        let bytes = decode_hex(&hex).map_err(serde::de::Error::custom)?;
        Self::from_slice(&bytes).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519Signature({}...)", hex::encode(&self.0[..4]))
    }
}

// ---------------------------------------------------------------------------
// Ed25519KeyPair impls
// ---------------------------------------------------------------------------

impl Ed25519KeyPair {
    /// Generate a new random Ed25519 key pair.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        let signing_key = ed25519_dalek::SigningKey::generate(&mut csprng);
        Self { signing_key }
    }

    /// Create a key pair from a raw 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = ed25519_dalek::SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Create a key pair from a hex-encoded 32-byte seed.
    pub fn from_seed_hex(hex: &str) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(decode_hex(hex)?);
        let seed: &[u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            CryptoError::KeyError(format!(
                "Ed25519 seed must be 32 bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self::from_seed(seed))
    }

    /// Export the seed as hex for writing to a key file.
    pub fn to_seed_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.signing_key.to_bytes()))
    }

    /// Get the public key from this key pair.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign canonical bytes.
    pub fn sign(&self, data: &CanonicalBytes) -> Ed25519Signature {
        let sig = self.signing_key.sign(data.as_bytes());
        Ed25519Signature(sig.to_bytes())
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519KeyPair(<private>)")
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verify a raw Ed25519 signature over canonical bytes.
///
/// The signature is any decoded byte slice; anything other than exactly 64
/// bytes is a verification failure. Verification is strict: small-order
/// public keys and non-canonical `R` encodings are rejected.
pub fn verify(
    data: &CanonicalBytes,
    signature: &[u8],
    public_key: &Ed25519PublicKey,
) -> Result<(), CryptoError> {
    let signature = Ed25519Signature::from_slice(signature)?;
    let vk = public_key.to_verifying_key()?;
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    vk.verify_strict(data.as_bytes(), &sig)
        .map_err(|e| CryptoError::VerificationFailed(format!("Ed25519 verification failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sign_and_verify() {
        let kp = Ed25519KeyPair::generate();
        let canonical = CanonicalBytes::new(&json!({"message": "hello", "nonce": 42})).unwrap();
        let sig = kp.sign(&canonical);
        verify(&canonical, sig.as_bytes(), &kp.public_key()).expect("valid signature");
    }

    #[test]
    fn test_verify_wrong_key_fails() {
        let kp1 = Ed25519KeyPair::generate();
        let kp2 = Ed25519KeyPair::generate();
        let canonical = CanonicalBytes::new(&json!({"test": true})).unwrap();
        let sig = kp1.sign(&canonical);
        assert!(verify(&canonical, sig.as_bytes(), &kp2.public_key()).is_err());
    }

    #[test]
    fn test_verify_wrong_message_fails() {
        let kp = Ed25519KeyPair::generate();
        let original = CanonicalBytes::new(&json!({"msg": "original"})).unwrap();
        let tampered = CanonicalBytes::new(&json!({"msg": "tampered"})).unwrap();
        let sig = kp.sign(&original);
        assert!(verify(&tampered, sig.as_bytes(), &kp.public_key()).is_err());
    }

    #[test]
    fn test_truncated_signature_fails_closed() {
        let kp = Ed25519KeyPair::generate();
        let canonical = CanonicalBytes::new(&json!({"x": 1})).unwrap();
        let sig = kp.sign(&canonical);
        let err = verify(&canonical, &sig.as_bytes()[..63], &kp.public_key()).unwrap_err();
        assert!(matches!(err, CryptoError::VerificationFailed(_)));
    }

    #[test]
    fn test_small_order_key_is_rejected() {
        // Identity point as key, identity R and zero s: satisfies the
        // cofactorless equation for every message.
        let mut identity = [0u8; 32];
        identity[0] = 1;
        let mut forged = [0u8; 64];
        forged[..32].copy_from_slice(&identity);

        let canonical = CanonicalBytes::new(&json!({"any": "message"})).unwrap();
        let result = verify(&canonical, &forged, &Ed25519PublicKey::from_bytes(identity));
        assert!(matches!(result, Err(CryptoError::VerificationFailed(_))));
    }

    #[test]
    fn test_deterministic_from_seed() {
        let kp1 = Ed25519KeyPair::from_seed(&[42u8; 32]);
        let kp2 = Ed25519KeyPair::from_seed_hex(&hex::encode([42u8; 32])).unwrap();
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.to_seed_hex().as_str(), hex::encode([42u8; 32]));
    }

    #[test]
    fn test_multibase_carries_multicodec_prefix() {
        let kp = Ed25519KeyPair::from_seed(&[7u8; 32]);
        let mb = kp.public_key().to_multibase();
        // Ed25519 multikeys always render with this prefix.
        assert!(mb.starts_with("z6Mk"), "got {mb}");
        let decoded = crate::encoding::decode_multibase(&mb).unwrap();
        assert_eq!(Ed25519PublicKey::from_slice(&decoded).unwrap(), kp.public_key());
    }

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        assert!(Ed25519PublicKey::from_slice(&[0u8; 31]).is_err());
        assert!(Ed25519PublicKey::from_slice(&[0u8; 33]).is_err());
    }

    #[test]
    fn test_public_key_serde_is_hex() {
        let pk = Ed25519KeyPair::generate().public_key();
        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json.len(), 64 + 2);
        let back: Ed25519PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(pk, back);
    }

    #[test]
    fn test_keypair_debug_redacts() {
        let kp = Ed25519KeyPair::generate();
        assert_eq!(format!("{kp:?}"), "Ed25519KeyPair(<private>)");
    }
}
