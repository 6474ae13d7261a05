#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use btco_client::{ResilientClient, ResourceCache, ResourceFetcher, TrustEngineConfig};
use btco_crypto::encoding::{decode_base64, encode_base64};
use btco_crypto::Ed25519KeyPair;
use btco_vc::{CredentialVerifier, ProofSet, StaticDidResolver, VerifiableCredential};
use serde_json::{json, Value};

pub const ISSUER: &str = "did:example:issuer";
pub const SUBJECT: &str = "did:btco:123/0";

pub fn key_id(did: &str) -> String {
    format!("{did}#key-1")
}

/// Fetcher with no retries and the given cache TTL.
pub fn fetcher(ttl: Duration) -> ResourceFetcher {
    let mut cfg = TrustEngineConfig::local("http://127.0.0.1:1").unwrap();
    cfg.max_retries = 0;
    ResourceFetcher::new(
        Arc::new(ResilientClient::from_config(&cfg).unwrap()),
        Arc::new(ResourceCache::new(ttl)),
    )
}

pub fn did_document(did: &str, key: &Ed25519KeyPair) -> Value {
    json!({
        "@context": ["https://www.w3.org/ns/did/v1"],
        "id": did,
        "verificationMethod": [{
            "id": key_id(did),
            "type": "Ed25519VerificationKey2020",
            "controller": did,
            "publicKeyMultibase": key.public_key().to_multibase()
        }],
        "assertionMethod": [key_id(did)]
    })
}

/// A resolver that knows `ISSUER` with `key`.
pub fn resolver(key: &Ed25519KeyPair) -> Arc<StaticDidResolver> {
    let resolver = StaticDidResolver::new();
    resolver.insert(did_document(ISSUER, key)).unwrap();
    Arc::new(resolver)
}

pub fn verifier(key: &Ed25519KeyPair) -> CredentialVerifier {
    CredentialVerifier::new(resolver(key), fetcher(Duration::from_secs(300)))
}

pub fn unsigned(extra: Value) -> VerifiableCredential {
    let mut base = json!({
        "@context": ["https://www.w3.org/2018/credentials/v1"],
        "id": "urn:uuid:00000000-0000-4000-8000-000000000001",
        "type": ["VerifiableCredential"],
        "issuer": ISSUER,
        "issuanceDate": "2024-01-01T00:00:00Z",
        "credentialSubject": {"id": SUBJECT}
    });
    if let (Some(obj), Value::Object(more)) = (base.as_object_mut(), extra) {
        obj.extend(more);
    }
    serde_json::from_value(base).unwrap()
}

pub fn signed(key: &Ed25519KeyPair, extra: Value) -> VerifiableCredential {
    let mut vc = unsigned(extra);
    vc.sign_ed25519(key, &key_id(ISSUER), None).unwrap();
    vc
}

pub fn signature_bytes(vc: &VerifiableCredential) -> Vec<u8> {
    decode_base64(vc.first_proof().unwrap().proof_value.as_deref().unwrap()).unwrap()
}

pub fn with_signature(vc: &VerifiableCredential, sig: &[u8]) -> VerifiableCredential {
    let mut out = vc.clone();
    if let Some(p) = out.proof.as_mut().and_then(ProofSet::first_mut) {
        p.proof_value = Some(encode_base64(sig));
    }
    out
}
