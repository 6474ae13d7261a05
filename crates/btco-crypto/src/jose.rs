//! # JOSE / Compact JWT Verification
//!
//! Verifies a compact JWS (`header.payload.signature`) against a public JWK,
//! requiring the `iss` claim to equal the expected issuer.
//!
//! Algorithms supported by `jsonwebtoken` (EdDSA, ES256, ES384, RS*, PS*)
//! are delegated to it. `ES256K` is not, so it is verified here: SHA-256 over
//! the ASCII signing input, raw 64-byte `r‖s` signature, then the same
//! `iss`/`exp`/`nbf` checks `jsonwebtoken` applies.
//!
//! Claims other than `iss` are returned to the caller but not interpreted.

use std::str::FromStr;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::encoding::decode_base64url;
use crate::error::CryptoError;
use crate::key::Jwk;
use crate::secp256k1;

/// Clock skew tolerated on `exp`/`nbf`, matching `jsonwebtoken`'s default.
const LEEWAY_SECS: u64 = 60;

/// The JOSE algorithm name for ECDSA over secp256k1.
pub const ES256K: &str = "ES256K";

/// Verify a compact JWT and return its claims.
///
/// # Errors
///
/// [`CryptoError::Jwt`] for a malformed token, unknown algorithm, issuer
/// mismatch, or expired token; [`CryptoError::VerificationFailed`] for a bad
/// signature; [`CryptoError::KeyError`] when the JWK cannot be imported.
pub fn verify_jwt(token: &str, jwk: &Jwk, expected_issuer: &str) -> Result<Value, CryptoError> {
    let header = decode_header(token)?;
    let alg = header
        .get("alg")
        .and_then(Value::as_str)
        .ok_or_else(|| CryptoError::Jwt("header has no 'alg'".into()))?;

    if alg == ES256K {
        return verify_es256k(token, jwk, expected_issuer);
    }

    let algorithm = Algorithm::from_str(alg)
        .map_err(|_| CryptoError::Jwt(format!("unsupported algorithm {alg:?}")))?;
    let jwk_value =
        serde_json::to_value(jwk).map_err(|e| CryptoError::KeyError(e.to_string()))?;
    let import: jsonwebtoken::jwk::Jwk = serde_json::from_value(jwk_value)
        .map_err(|e| CryptoError::KeyError(format!("unusable JWK: {e}")))?;
    let key = DecodingKey::from_jwk(&import)
        .map_err(|e| CryptoError::KeyError(format!("cannot import JWK: {e}")))?;

    let mut validation = Validation::new(algorithm);
    validation.set_issuer(&[expected_issuer]);
    validation.set_required_spec_claims(&["iss"]);
    validation.validate_aud = false;
    validation.leeway = LEEWAY_SECS;

    jsonwebtoken::decode::<Value>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                CryptoError::VerificationFailed("JWT signature does not verify".into())
            }
            _ => CryptoError::Jwt(e.to_string()),
        })
}

fn verify_es256k(token: &str, jwk: &Jwk, expected_issuer: &str) -> Result<Value, CryptoError> {
    if !jwk.is_secp256k1() {
        return Err(CryptoError::KeyError(
            "ES256K requires an EC secp256k1 JWK".into(),
        ));
    }
    let (signing_input, signature_b64) = token
        .rsplit_once('.')
        .ok_or_else(|| CryptoError::Jwt("token is not compact JWS".into()))?;
    let (_, payload_b64) = signing_input
        .split_once('.')
        .ok_or_else(|| CryptoError::Jwt("token is not compact JWS".into()))?;

    let signature = decode_base64url(signature_b64)?;
    if signature.len() != 64 {
        return Err(CryptoError::VerificationFailed(format!(
            "ES256K signature must be 64 bytes, got {}",
            signature.len()
        )));
    }
    let public_key = crate::key::KeyMaterial::Jwk(jwk.clone()).secp256k1_public_key()?;
    let digest: [u8; 32] = Sha256::digest(signing_input.as_bytes()).into();
    secp256k1::verify_digest(&digest, &signature, &public_key)?;

    let claims: Value = serde_json::from_slice(&decode_base64url(payload_b64)?)
        .map_err(|e| CryptoError::Jwt(format!("payload is not JSON: {e}")))?;
    check_registered_claims(&claims, expected_issuer, jsonwebtoken::get_current_timestamp())?;
    Ok(claims)
}

fn check_registered_claims(claims: &Value, expected_issuer: &str, now: u64) -> Result<(), CryptoError> {
    match claims.get("iss").and_then(Value::as_str) {
        Some(iss) if iss == expected_issuer => {}
        Some(iss) => {
            return Err(CryptoError::Jwt(format!(
                "issuer {iss:?} does not match {expected_issuer:?}"
            )))
        }
        None => return Err(CryptoError::Jwt("missing 'iss' claim".into())),
    }
    if let Some(exp) = claims.get("exp").and_then(Value::as_u64) {
        if exp + LEEWAY_SECS < now {
            return Err(CryptoError::Jwt("token has expired".into()));
        }
    }
    if let Some(nbf) = claims.get("nbf").and_then(Value::as_u64) {
        if nbf > now + LEEWAY_SECS {
            return Err(CryptoError::Jwt("token is not yet valid".into()));
        }
    }
    Ok(())
}

fn decode_header(token: &str) -> Result<Value, CryptoError> {
    let mut parts = token.split('.');
    let (Some(header), Some(_), Some(_), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(CryptoError::Jwt("token is not compact JWS".into()));
    };
    serde_json::from_slice(&decode_base64url(header)?)
        .map_err(|e| CryptoError::Jwt(format!("header is not JSON: {e}")))
}
