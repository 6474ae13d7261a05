//! Credential verification against in-memory DID Documents.

mod common;

use std::sync::Arc;
use std::time::Duration;

use btco_crypto::encoding::{encode_base64, encode_base64url};
use btco_crypto::{Ed25519KeyPair, Secp256k1KeyPair};
use btco_vc::{
    CredentialVerifier, Proof, ProofSet, StaticDidResolver, VerificationStage,
};
use common::*;
use serde_json::json;
use sha2::Digest;

#[tokio::test]
async fn valid_credential_verifies_repeatably() {
    let key = Ed25519KeyPair::generate();
    let verifier = verifier(&key);
    let vc = signed(&key, json!({}));
    assert!(verifier.verify(&vc).await);
    assert!(verifier.verify(&vc).await);
}

#[tokio::test]
async fn any_flipped_signature_bit_fails() {
    let key = Ed25519KeyPair::generate();
    let verifier = verifier(&key);
    let vc = signed(&key, json!({}));
    let sig = signature_bytes(&vc);

    for bit in 0..sig.len() * 8 {
        let mut tampered = sig.clone();
        tampered[bit / 8] ^= 1 << (bit % 8);
        let outcome = verifier.verify_detailed(&with_signature(&vc, &tampered)).await;
        assert_eq!(
            outcome.map_err(|f| f.stage),
            Err(VerificationStage::Signature),
            "bit {bit}"
        );
    }
}

#[tokio::test]
async fn tampered_subject_fails() {
    let key = Ed25519KeyPair::generate();
    let mut vc = signed(&key, json!({}));
    vc.credential_subject = json!({"id": "did:btco:999/0"});
    assert!(!verifier(&key).verify(&vc).await);
}

#[tokio::test]
async fn expired_credential_fails_despite_valid_signature() {
    let key = Ed25519KeyPair::generate();
    let vc = signed(&key, json!({"expirationDate": "2000-01-01T00:00:00Z"}));
    let failure = verifier(&key).verify_detailed(&vc).await.unwrap_err();
    assert_eq!(failure.stage, VerificationStage::Expiration);

    let future = signed(&key, json!({"expirationDate": "2999-01-01T00:00:00Z"}));
    assert!(verifier(&key).verify(&future).await);
}

#[tokio::test]
async fn expiration_without_offset_is_read_as_utc() {
    let key = Ed25519KeyPair::generate();
    for date in ["2999-01-01T00:00:00", "2999-01-01", "2999-01-01T00:00:00.250"] {
        let vc = signed(&key, json!({"expirationDate": date}));
        assert_eq!(verifier(&key).verify_detailed(&vc).await, Ok(()), "{date}");
    }

    let past = signed(&key, json!({"expirationDate": "2000-01-01"}));
    let failure = verifier(&key).verify_detailed(&past).await.unwrap_err();
    assert_eq!(failure.stage, VerificationStage::Expiration);
}

#[tokio::test]
async fn missing_proof_or_issuer_is_structural_failure() {
    let key = Ed25519KeyPair::generate();
    let verifier = verifier(&key);

    let unsigned = unsigned(json!({}));
    let failure = verifier.verify_detailed(&unsigned).await.unwrap_err();
    assert_eq!(failure.stage, VerificationStage::Structure);

    let mut no_issuer = signed(&key, json!({}));
    no_issuer.issuer = None;
    let failure = verifier.verify_detailed(&no_issuer).await.unwrap_err();
    assert_eq!(failure.stage, VerificationStage::Structure);

    let mut empty = signed(&key, json!({}));
    empty.proof = Some(ProofSet::Array(Vec::new()));
    assert!(!verifier.verify(&empty).await);
}

#[tokio::test]
async fn malformed_json_is_invalid() {
    let key = Ed25519KeyPair::generate();
    assert!(!verifier(&key).verify_value(&json!({"proof": 42})).await);
    assert!(!verifier(&key).verify_value(&json!("credential")).await);
    let good = serde_json::to_value(signed(&key, json!({}))).unwrap();
    assert!(verifier(&key).verify_value(&good).await);
}

#[tokio::test]
async fn unknown_issuer_fails_resolution() {
    let key = Ed25519KeyPair::generate();
    let verifier = CredentialVerifier::new(Arc::new(StaticDidResolver::new()), fetcher(Duration::ZERO));
    let failure = verifier.verify_detailed(&signed(&key, json!({}))).await.unwrap_err();
    assert_eq!(failure.stage, VerificationStage::IssuerResolution);
}

#[tokio::test]
async fn non_document_resolution_falls_back_to_document_form() {
    let key = Ed25519KeyPair::generate();
    let resolver = StaticDidResolver::new();
    resolver.insert(did_document(ISSUER, &key)).unwrap();
    resolver.insert_other_content(ISSUER, "image/png", json!({"inscription": "raw bytes"}));
    let verifier = CredentialVerifier::new(Arc::new(resolver), fetcher(Duration::ZERO));
    assert!(verifier.verify(&signed(&key, json!({}))).await);
}

#[tokio::test]
async fn unknown_verification_method_fails_lookup() {
    let key = Ed25519KeyPair::generate();
    let mut vc = unsigned(json!({}));
    vc.sign_ed25519(&key, "did:example:issuer#key-9", None).unwrap();
    let failure = verifier(&key).verify_detailed(&vc).await.unwrap_err();
    assert_eq!(failure.stage, VerificationStage::MethodLookup);
}

#[tokio::test]
async fn relative_method_ids_and_embedded_methods_are_found() {
    let key = Ed25519KeyPair::generate();
    let resolver = StaticDidResolver::new();
    resolver
        .insert(json!({
            "id": ISSUER,
            "verificationMethod": [],
            "assertionMethod": [{
                "id": "#key-1",
                "type": "Ed25519VerificationKey2018",
                "controller": ISSUER,
                "publicKeyHex": key.public_key().to_hex()
            }]
        }))
        .unwrap();
    let verifier = CredentialVerifier::new(Arc::new(resolver), fetcher(Duration::ZERO));
    assert!(verifier.verify(&signed(&key, json!({}))).await);
}

#[tokio::test]
async fn only_the_first_proof_is_checked() {
    let key = Ed25519KeyPair::generate();
    let verifier = verifier(&key);

    let mut vc = unsigned(json!({}));
    let proof = Proof::data_integrity(key_id(ISSUER), "2024-01-01T00:00:00Z");
    vc.proof = Some(ProofSet::Array(vec![proof.clone(), proof]));
    let message = vc.signing_input().unwrap();
    let good = encode_base64(key.sign(&message).as_bytes());
    let junk = encode_base64(&[0u8; 64]);

    let set = |first: &str, second: &str| {
        let mut out = vc.clone();
        if let Some(ProofSet::Array(proofs)) = out.proof.as_mut() {
            proofs[0].proof_value = Some(first.to_string());
            proofs[1].proof_value = Some(second.to_string());
        }
        out
    };
    assert!(verifier.verify(&set(&good, &junk)).await);
    assert!(!verifier.verify(&set(&junk, &good)).await);
}

#[tokio::test]
async fn bbs_and_unknown_proof_types_fail_closed() {
    let key = Ed25519KeyPair::generate();
    let verifier = verifier(&key);
    for proof_type in ["BbsBlsSignature2020", "SomethingElse2030"] {
        let mut vc = signed(&key, json!({}));
        if let Some(p) = vc.proof.as_mut().and_then(ProofSet::first_mut) {
            p.proof_type = proof_type.to_string();
        }
        let failure = verifier.verify_detailed(&vc).await.unwrap_err();
        assert_eq!(failure.stage, VerificationStage::Signature, "{proof_type}");
    }
}

#[tokio::test]
async fn secp256k1_data_integrity_with_jwk() {
    let key = Secp256k1KeyPair::generate();
    let resolver = StaticDidResolver::new();
    resolver
        .insert(json!({
            "id": ISSUER,
            "verificationMethod": [{
                "id": key_id(ISSUER),
                "type": "EcdsaSecp256k1VerificationKey2019",
                "controller": ISSUER,
                "publicKeyJwk": key.public_key().to_jwk()
            }]
        }))
        .unwrap();
    let verifier = CredentialVerifier::new(Arc::new(resolver), fetcher(Duration::ZERO));

    let mut vc = unsigned(json!({}));
    vc.sign_secp256k1(&key, &key_id(ISSUER), None).unwrap();
    assert!(verifier.verify(&vc).await);

    let mut sig = signature_bytes(&vc);
    let last = sig.len() - 1;
    sig[last] ^= 0x01;
    assert!(!verifier.verify(&with_signature(&vc, &sig)).await);
}

#[tokio::test]
async fn jwt_proof_with_es256k() {
    let key = Secp256k1KeyPair::generate();
    let resolver = StaticDidResolver::new();
    resolver
        .insert(json!({
            "id": ISSUER,
            "verificationMethod": [{
                "id": key_id(ISSUER),
                "type": "JsonWebKey2020",
                "controller": ISSUER,
                "publicKeyJwk": key.public_key().to_jwk()
            }]
        }))
        .unwrap();
    let verifier = CredentialVerifier::new(Arc::new(resolver), fetcher(Duration::ZERO));

    let token = |iss: &str| {
        let header = encode_base64url(br#"{"alg":"ES256K"}"#);
        let payload = encode_base64url(json!({"iss": iss, "vc": {}}).to_string().as_bytes());
        let input = format!("{header}.{payload}");
        let digest: [u8; 32] = sha2::Sha256::digest(input.as_bytes()).into();
        let sig = key.sign_digest_raw(&digest).unwrap();
        format!("{input}.{}", encode_base64url(&sig))
    };
    let with_token = |t: String| {
        let mut vc = unsigned(json!({}));
        let mut proof = Proof::data_integrity(key_id(ISSUER), "2024-01-01T00:00:00Z");
        proof.proof_type = "JwtProof2020".into();
        proof.proof_value = Some(t);
        vc.proof = Some(ProofSet::Single(Box::new(proof)));
        vc
    };

    assert!(verifier.verify(&with_token(token(ISSUER))).await);
    assert!(!verifier.verify(&with_token(token("did:example:other"))).await);
}

#[tokio::test]
async fn malformed_sibling_method_does_not_block_issuer_resolution() {
    let key = Ed25519KeyPair::generate();
    let mut doc = did_document(ISSUER, &key);
    let methods = doc["verificationMethod"].as_array_mut().unwrap();
    methods.insert(0, json!({"type": "Ed25519VerificationKey2020", "publicKeyMultibase": "zMissingId"}));
    methods.push(json!({"id": "#jwk", "type": "JsonWebKey2020", "publicKeyJwk": {"crv": "Ed25519"}}));

    let resolver = StaticDidResolver::new();
    resolver.insert(doc).unwrap();
    let verifier = CredentialVerifier::new(Arc::new(resolver), fetcher(Duration::from_secs(300)));
    assert_eq!(verifier.verify_detailed(&signed(&key, json!({}))).await, Ok(()));
}
