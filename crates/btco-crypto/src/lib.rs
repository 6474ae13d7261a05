//! # btco-crypto — Signature Verification Primitives
//!
//! Pure, synchronous building blocks used by the credential verifier:
//!
//! - **Ed25519** verification over canonical message bytes (no pre-hash).
//! - **secp256k1** ECDSA over SHA-256 of canonical message bytes, accepting
//!   DER (low-S normalized) or raw `r‖s` signatures.
//! - **JOSE/JWT** compact token verification with an issuer constraint,
//!   including `ES256K` which the `jsonwebtoken` crate does not cover.
//! - **BBS+** recognized but unimplemented; always fails closed.
//! - **Key material** decoding from the four DID Document encodings
//!   (`publicKeyJwk`, `publicKeyMultibase`, `publicKeyHex`,
//!   `publicKeyBase64`), modelled as the [`KeyMaterial`] tagged union.
//!
//! ## Crate Policy
//!
//! - Depends only on `btco-core` internally.
//! - Every verification entry point returns `Result<(), CryptoError>`; no
//!   decode or curve error ever panics.
//! - No mocking of cryptographic operations in tests.
//! - No `unsafe` code.

pub mod bbs;
pub mod ed25519;
pub mod encoding;
pub mod error;
pub mod jose;
pub mod key;
pub mod secp256k1;
pub mod sha256;

pub use ed25519::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use error::CryptoError;
pub use key::{Jwk, KeyMaterial};
pub use secp256k1::{Secp256k1KeyPair, Secp256k1PublicKey};
pub use sha256::sha256_digest;
