//! # Signature Dispatch
//!
//! Selects a verification path from the proof kind and, for Data Integrity
//! proofs, from the verification method's key type:
//!
//! - type contains `Ed25519` → Ed25519 over the canonical message
//! - type contains `secp256k1` / `Secp256k1` → ECDSA over SHA-256 of it
//! - anything else fails
//!
//! JWT proofs verify the compact token in `proofValue` against the method's
//! JWK with the credential issuer as the required `iss`. BBS proofs always
//! fail. Every error becomes a [`VerificationFailure`]; nothing propagates.

use btco_crypto::encoding::decode_base64;
use btco_crypto::{bbs, ed25519, jose, secp256k1, KeyMaterial};

use crate::credential::VerifiableCredential;
use crate::document::VerificationMethod;
use crate::error::{VerificationFailure, VerificationStage};
use crate::proof::{Proof, ProofKind};

fn fail(reason: impl Into<String>) -> VerificationFailure {
    VerificationFailure::new(VerificationStage::Signature, reason)
}

/// Verify `proof` on `credential` with the key published in `method`.
pub fn verify_proof(
    credential: &VerifiableCredential,
    proof: &Proof,
    method: &VerificationMethod,
) -> Result<(), VerificationFailure> {
    match proof.kind() {
        ProofKind::DataIntegrity => verify_data_integrity(credential, proof, method),
        ProofKind::Jwt => verify_jwt_proof(credential, proof, method),
        ProofKind::Bbs => {
            let message = credential.signing_input().map_err(|e| fail(e.to_string()))?;
            bbs::verify(&message, &[], &[]).map_err(|e| fail(e.to_string()))
        }
        ProofKind::Unknown => Err(fail(format!("unsupported proof type {:?}", proof.proof_type))),
    }
}

fn verify_data_integrity(
    credential: &VerifiableCredential,
    proof: &Proof,
    method: &VerificationMethod,
) -> Result<(), VerificationFailure> {
    let message = credential
        .signing_input()
        .map_err(|e| fail(format!("cannot canonicalize credential: {e}")))?;
    let encoded = proof
        .proof_value
        .as_deref()
        .ok_or_else(|| fail("proof has no proofValue"))?;
    let signature = decode_base64(encoded).map_err(|e| fail(e.to_string()))?;
    let key = key_material(method)?;

    let key_type = method.method_type.as_str();
    let result = if key_type.contains("Ed25519") {
        key.ed25519_public_key()
            .and_then(|pk| ed25519::verify(&message, &signature, &pk))
    } else if key_type.contains("secp256k1") || key_type.contains("Secp256k1") {
        key.secp256k1_public_key()
            .and_then(|pk| secp256k1::verify(&message, &signature, &pk))
    } else {
        return Err(fail(format!("unsupported verification method type {key_type:?}")));
    };
    result.map_err(|e| fail(e.to_string()))
}

fn verify_jwt_proof(
    credential: &VerifiableCredential,
    proof: &Proof,
    method: &VerificationMethod,
) -> Result<(), VerificationFailure> {
    let token = proof
        .proof_value
        .as_deref()
        .ok_or_else(|| fail("JWT proof has no proofValue"))?;
    let jwk = key_material(method)?
        .as_jwk()
        .ok_or_else(|| fail("JWT proofs require a publicKeyJwk verification method"))?;
    let issuer = credential.issuer_id().unwrap_or_default();
    // Payload claims beyond `iss` are not compared with the credential body.
    jose::verify_jwt(token, jwk, issuer)
        .map(|_| ())
        .map_err(|e| fail(e.to_string()))
}

fn key_material(method: &VerificationMethod) -> Result<&KeyMaterial, VerificationFailure> {
    method
        .key
        .as_ref()
        .ok_or_else(|| fail(format!("verification method {} has no supported key field", method.id)))
}
