//! # Verify Subcommand
//!
//! Runs the full verification pipeline over a credential file and reports
//! the stage at which it was rejected.
//!
//! DID Documents come either from files (`--did-document`, repeatable) or
//! from a universal-resolver endpoint (`--resolver-url`, falling back to
//! `BTCO_RESOLVER_URL`). Status lists are always fetched over HTTP through
//! the resilient client.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use url::Url;

use btco_client::{ResilientClient, ResourceCache, ResourceFetcher, TrustEngineConfig};
use btco_vc::{CredentialVerifier, DidResolver, HttpDidResolver, StaticDidResolver, VerifiableCredential};

/// Arguments for the `btco verify` subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Path to the credential JSON file.
    #[arg(value_name = "FILE")]
    pub credential: PathBuf,

    #[command(flatten)]
    pub resolver: ResolverArgs,
}

/// DID Document sources shared by `verify` and `issue`.
#[derive(Args, Debug, Clone, Default)]
pub struct ResolverArgs {
    /// DID Document file to resolve issuers from. Repeatable.
    #[arg(long = "did-document", value_name = "FILE")]
    pub did_documents: Vec<PathBuf>,

    /// Universal-resolver base URL.
    #[arg(long)]
    pub resolver_url: Option<Url>,
}

/// Build a fetcher over a fresh resilient client and cache.
pub fn build_fetcher(config: &TrustEngineConfig) -> Result<ResourceFetcher> {
    let client = ResilientClient::from_config(config).context("failed to build HTTP client")?;
    Ok(ResourceFetcher::new(
        Arc::new(client),
        Arc::new(ResourceCache::new(config.cache_ttl())),
    ))
}

/// Build a verifier from DID Document files or a resolver endpoint.
///
/// Files take precedence; otherwise `resolver_url` or the configured
/// resolver is used.
pub fn build_verifier(config: &TrustEngineConfig, source: &ResolverArgs) -> Result<CredentialVerifier> {
    let fetcher = build_fetcher(config)?;
    let resolver: Arc<dyn DidResolver> = if !source.did_documents.is_empty() {
        Arc::new(load_documents(&source.did_documents)?)
    } else if let Some(url) = source.resolver_url.as_ref().or(config.resolver_url.as_ref()) {
        tracing::debug!(resolver = %url, "resolving issuers over HTTP");
        Arc::new(HttpDidResolver::new(url.clone(), fetcher.clone()))
    } else {
        bail!("no DID source: pass --did-document or --resolver-url, or set BTCO_RESOLVER_URL");
    };
    Ok(CredentialVerifier::new(resolver, fetcher))
}

fn load_documents(paths: &[PathBuf]) -> Result<StaticDidResolver> {
    let resolver = StaticDidResolver::new();
    for path in paths {
        let document = crate::read_json(path)?;
        resolver
            .insert(document)
            .with_context(|| format!("not a DID Document: {}", path.display()))?;
    }
    Ok(resolver)
}

/// Execute the verify subcommand.
pub async fn run_verify(args: &VerifyArgs, config: &TrustEngineConfig) -> Result<u8> {
    let verifier = build_verifier(config, &args.resolver)?;
    verify_file(&verifier, &args.credential).await
}

async fn verify_file(verifier: &CredentialVerifier, path: &Path) -> Result<u8> {
    let value = crate::read_json(path)?;
    let credential: VerifiableCredential = match serde_json::from_value(value) {
        Ok(credential) => credential,
        Err(e) => {
            println!("FAIL: not a verifiable credential: {e}");
            return Ok(1);
        }
    };

    match verifier.verify_detailed(&credential).await {
        Ok(()) => {
            println!("OK: credential is valid");
            if let Some(issuer) = credential.issuer_id() {
                println!("  Issuer:  {issuer}");
            }
            if let Some(subject) = credential.subject_id() {
                println!("  Subject: {subject}");
            }
            Ok(0)
        }
        Err(failure) => {
            println!("FAIL: {failure}");
            Ok(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use btco_crypto::Ed25519KeyPair;
    use serde_json::json;

    const ISSUER: &str = "did:example:cli-issuer";

    fn config() -> TrustEngineConfig {
        let mut config = TrustEngineConfig::local("http://127.0.0.1:1").unwrap();
        config.max_retries = 0;
        config
    }

    fn write_fixture(dir: &Path, key: &Ed25519KeyPair) -> (PathBuf, PathBuf) {
        let vm = format!("{ISSUER}#key-1");
        let doc = json!({
            "id": ISSUER,
            "verificationMethod": [{
                "id": vm,
                "type": "Ed25519VerificationKey2020",
                "controller": ISSUER,
                "publicKeyMultibase": key.public_key().to_multibase(),
            }],
        });
        let mut credential: VerifiableCredential = serde_json::from_value(json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "type": ["VerifiableCredential"],
            "issuer": ISSUER,
            "issuanceDate": "2024-01-01T00:00:00Z",
            "credentialSubject": {"id": "did:btco:42/0"},
        }))
        .unwrap();
        credential.sign_ed25519(key, &vm, None).unwrap();

        let doc_path = dir.join("did.json");
        let vc_path = dir.join("vc.json");
        std::fs::write(&doc_path, doc.to_string()).unwrap();
        std::fs::write(&vc_path, serde_json::to_string(&credential).unwrap()).unwrap();
        (doc_path, vc_path)
    }

    #[tokio::test]
    async fn valid_credential_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let key = Ed25519KeyPair::generate();
        let (doc, vc) = write_fixture(dir.path(), &key);

        let args = VerifyArgs {
            credential: vc,
            resolver: ResolverArgs {
                did_documents: vec![doc],
                resolver_url: None,
            },
        };
        assert_eq!(run_verify(&args, &config()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn wrong_key_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let (doc, _) = write_fixture(dir.path(), &Ed25519KeyPair::generate());
        let (_, vc) = write_fixture(other.path(), &Ed25519KeyPair::generate());

        let args = VerifyArgs {
            credential: vc,
            resolver: ResolverArgs {
                did_documents: vec![doc],
                resolver_url: None,
            },
        };
        assert_eq!(run_verify(&args, &config()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn non_credential_json_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let (doc, _) = write_fixture(dir.path(), &Ed25519KeyPair::generate());
        let vc = dir.path().join("list.json");
        std::fs::write(&vc, "[1, 2, 3]").unwrap();

        let args = VerifyArgs {
            credential: vc,
            resolver: ResolverArgs {
                did_documents: vec![doc],
                resolver_url: None,
            },
        };
        assert_eq!(run_verify(&args, &config()).await.unwrap(), 1);
    }

    #[test]
    fn missing_did_source_is_an_error() {
        let err = build_verifier(&config(), &ResolverArgs::default()).unwrap_err();
        assert!(err.to_string().contains("no DID source"));
    }

    #[test]
    fn document_without_did_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, r#"{"id": "https://example.com/not-a-did"}"#).unwrap();
        let source = ResolverArgs {
            did_documents: vec![path],
            resolver_url: None,
        };
        let err = build_verifier(&config(), &source).unwrap_err();
        assert!(format!("{err:#}").contains("not a DID Document"));
    }

    #[test]
    fn configured_resolver_url_is_used() {
        let mut config = config();
        config.resolver_url = Some(Url::parse("http://127.0.0.1:1/resolver").unwrap());
        assert!(build_verifier(&config, &ResolverArgs::default()).is_ok());
    }
}
