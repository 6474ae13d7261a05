//! # Issue Subcommand
//!
//! Issues a collectible credential through the external issuance API, then
//! self-verifies the returned document before printing it.
//!
//! `--store FILE` keeps a local credential registry between runs: the
//! snapshot is restored before issuance and rewritten afterwards.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use btco_client::{IssuanceApiClient, ResilientClient, TrustEngineConfig};
use btco_core::Did;
use btco_vc::{
    ContentInfo, CredentialIssuer, CredentialMetadata, CredentialRepository, InMemoryCredentialRepository,
    IssueParams,
};

use crate::verify::{build_verifier, ResolverArgs};

/// Arguments for the `btco issue` subcommand.
#[derive(Args, Debug)]
pub struct IssueArgs {
    /// DID of the credential subject (the inscription owner).
    #[arg(long)]
    pub subject: Did,

    /// Issuer DID. Defaults to `BTCO_PLATFORM_DID`.
    #[arg(long)]
    pub issuer: Option<Did>,

    /// Inscription identifier the credential describes.
    #[arg(long)]
    pub inscription_id: String,

    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub creator: String,

    #[arg(long)]
    pub description: Option<String>,

    /// Extra subject attribute as KEY=VALUE. VALUE is parsed as JSON when
    /// possible, otherwise kept as a string. Repeatable.
    #[arg(long = "attribute", value_name = "KEY=VALUE")]
    pub attributes: Vec<String>,

    /// File holding the inscribed content; its SHA-256 and size are recorded.
    #[arg(long, value_name = "FILE")]
    pub content_file: PathBuf,

    /// MIME type of the content.
    #[arg(long)]
    pub content_type: String,

    #[arg(long)]
    pub content_url: Option<String>,

    #[command(flatten)]
    pub resolver: ResolverArgs,

    /// Credential registry snapshot to restore from and write back to.
    #[arg(long, value_name = "FILE")]
    pub store: Option<PathBuf>,

    /// Write the issued credential here instead of stdout.
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Execute the issue subcommand.
pub async fn run_issue(args: &IssueArgs, config: &TrustEngineConfig) -> Result<u8> {
    let params = build_params(args, config)?;

    let verifier = build_verifier(config, &args.resolver)?;
    let client = ResilientClient::from_config(config).context("failed to build HTTP client")?;
    let api = IssuanceApiClient::new(Arc::new(client), config);

    let repository = Arc::new(InMemoryCredentialRepository::new());
    if let Some(store) = args.store.as_deref().filter(|p| p.exists()) {
        if !repository.restore_from_backup(store).await {
            bail!("failed to restore credential store: {}", store.display());
        }
        tracing::info!(store = %store.display(), credentials = repository.len(), "restored credential store");
    }

    let issuer = CredentialIssuer::new(api, Arc::new(verifier), repository.clone());
    let credential = match issuer.issue(&params).await {
        Ok(credential) => credential,
        Err(e) => {
            println!("FAIL: [{}] {e}", e.code());
            return Ok(1);
        }
    };

    if let Some(store) = &args.store {
        if !repository.create_backup(store).await {
            bail!("failed to write credential store: {}", store.display());
        }
    }

    let value = serde_json::to_value(&credential).context("failed to serialize credential")?;
    crate::write_json(&value, args.output.as_deref())?;
    Ok(0)
}

fn build_params(args: &IssueArgs, config: &TrustEngineConfig) -> Result<IssueParams> {
    let issuer_did = args
        .issuer
        .clone()
        .or_else(|| config.platform_did.clone())
        .ok_or_else(|| anyhow!("no issuer: pass --issuer or set BTCO_PLATFORM_DID"))?;

    Ok(IssueParams {
        subject_did: args.subject.clone(),
        issuer_did,
        metadata: CredentialMetadata {
            inscription_id: args.inscription_id.clone(),
            title: args.title.clone(),
            creator: args.creator.clone(),
            description: args.description.clone(),
            attributes: parse_attributes(&args.attributes)?,
        },
        content_info: content_info(&args.content_file, &args.content_type, args.content_url.clone())?,
    })
}

fn parse_attributes(raw: &[String]) -> Result<Map<String, Value>> {
    let mut attributes = Map::new();
    for pair in raw {
        let (key, value) = pair
            .split_once('=')
            .filter(|(key, _)| !key.is_empty())
            .ok_or_else(|| anyhow!("attribute must be KEY=VALUE, got {pair:?}"))?;
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        attributes.insert(key.to_string(), value);
    }
    Ok(attributes)
}

fn content_info(path: &Path, mime_type: &str, url: Option<String>) -> Result<ContentInfo> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read content: {}", path.display()))?;
    Ok(ContentInfo {
        mime_type: mime_type.to_string(),
        hash: hex::encode(Sha256::digest(&bytes)),
        size: Some(bytes.len() as u64),
        url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use btco_crypto::Ed25519KeyPair;
    use btco_vc::VerifiableCredential;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ISSUER: &str = "did:btco:1";

    fn args(dir: &Path) -> IssueArgs {
        let content = dir.join("art.png");
        std::fs::write(&content, b"abc").unwrap();
        IssueArgs {
            subject: Did::new("did:btco:2/0").unwrap(),
            issuer: None,
            inscription_id: "abc123i0".into(),
            title: "Sunrise".into(),
            creator: "did:btco:3".into(),
            description: None,
            attributes: vec![],
            content_file: content,
            content_type: "image/png".into(),
            content_url: None,
            resolver: ResolverArgs::default(),
            store: None,
            output: Some(dir.join("out.json")),
        }
    }

    #[test]
    fn attributes_parse_json_values_and_fall_back_to_strings() {
        let parsed = parse_attributes(&["edition=3".into(), "rare=true".into(), "color=red".into()]).unwrap();
        assert_eq!(parsed["edition"], json!(3));
        assert_eq!(parsed["rare"], json!(true));
        assert_eq!(parsed["color"], json!("red"));
    }

    #[test]
    fn attribute_without_separator_is_rejected() {
        assert!(parse_attributes(&["edition".into()]).is_err());
        assert!(parse_attributes(&["=3".into()]).is_err());
    }

    #[test]
    fn content_hash_is_sha256_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let info = content_info(&args(dir.path()).content_file, "image/png", None).unwrap();
        assert_eq!(
            info.hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(info.size, Some(3));
    }

    #[test]
    fn issuer_defaults_to_platform_did() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TrustEngineConfig::local("http://127.0.0.1:1").unwrap();
        assert!(build_params(&args(dir.path()), &config).is_err());

        config.platform_did = Some(Did::new(ISSUER).unwrap());
        let params = build_params(&args(dir.path()), &config).unwrap();
        assert_eq!(params.issuer_did.as_str(), ISSUER);
    }

    #[tokio::test]
    async fn issued_credential_is_written_and_stored() {
        let dir = tempfile::tempdir().unwrap();
        let key = Ed25519KeyPair::generate();
        let vm = format!("{ISSUER}#key-1");

        let doc_path = dir.path().join("did.json");
        std::fs::write(
            &doc_path,
            json!({
                "id": ISSUER,
                "verificationMethod": [{
                    "id": vm,
                    "type": "Ed25519VerificationKey2020",
                    "controller": ISSUER,
                    "publicKeyMultibase": key.public_key().to_multibase(),
                }],
            })
            .to_string(),
        )
        .unwrap();

        let mut signed: VerifiableCredential = serde_json::from_value(json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "id": "urn:uuid:5a0a4f5e-7d55-4c1b-9d1e-0d0c8a1f6a10",
            "type": ["VerifiableCredential", "VerifiableCollectible"],
            "issuer": ISSUER,
            "issuanceDate": "2024-01-01T00:00:00Z",
            "credentialSubject": {"id": "did:btco:2/0", "inscriptionId": "abc123i0"},
        }))
        .unwrap();
        signed.sign_ed25519(&key, &vm, None).unwrap();

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/issueCredential"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": signed})))
            .mount(&server)
            .await;

        let mut args = args(dir.path());
        args.issuer = Some(Did::new(ISSUER).unwrap());
        args.resolver.did_documents = vec![doc_path];
        args.store = Some(dir.path().join("store.json"));
        let config = TrustEngineConfig::local(&server.uri()).unwrap();

        assert_eq!(run_issue(&args, &config).await.unwrap(), 0);

        let written = crate::read_json(&dir.path().join("out.json")).unwrap();
        assert_eq!(written["id"], json!("urn:uuid:5a0a4f5e-7d55-4c1b-9d1e-0d0c8a1f6a10"));

        let restored = InMemoryCredentialRepository::new();
        assert!(restored.restore_from_backup(&dir.path().join("store.json")).await);
        assert_eq!(restored.find_credentials_by_inscription("abc123i0").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn api_rejection_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let doc_path = dir.path().join("did.json");
        std::fs::write(&doc_path, json!({"id": ISSUER}).to_string()).unwrap();

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/issueCredential"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"error": {"code": "QUOTA_EXCEEDED", "message": "slow down"}})),
            )
            .mount(&server)
            .await;

        let mut args = args(dir.path());
        args.issuer = Some(Did::new(ISSUER).unwrap());
        args.resolver.did_documents = vec![doc_path];
        let config = TrustEngineConfig::local(&server.uri()).unwrap();

        assert_eq!(run_issue(&args, &config).await.unwrap(), 1);
        assert!(!dir.path().join("out.json").exists());
    }
}
