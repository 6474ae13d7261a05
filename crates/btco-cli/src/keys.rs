//! # Key Management Subcommands
//!
//! `btco keygen` writes a hex-encoded keypair to `{prefix}.key` and
//! `{prefix}.pub`. `btco sign` attaches a `DataIntegrityProof` to a
//! credential using such a key.
//!
//! ## Security Invariant
//!
//! Proofs are computed over the same canonical message the verifier
//! reconstructs (JCS of the credential with every `proofValue` removed), so
//! anything `btco sign` emits verifies under `btco verify` given the matching
//! DID Document.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, ValueEnum};

use btco_core::DidUrl;
use btco_crypto::{Ed25519KeyPair, Secp256k1KeyPair};
use btco_vc::VerifiableCredential;

/// Signature scheme for generated and loaded keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyScheme {
    Ed25519,
    Secp256k1,
}

/// Arguments for the `btco keygen` subcommand.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    #[arg(long, value_enum, default_value = "ed25519")]
    pub scheme: KeyScheme,

    /// Output directory for the keypair files.
    #[arg(long, short, default_value = ".")]
    pub output: PathBuf,

    /// Prefix for the key filenames.
    #[arg(long, default_value = "btco")]
    pub prefix: String,
}

/// Arguments for the `btco sign` subcommand.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Path to the private key file (hex).
    #[arg(long)]
    pub key: PathBuf,

    #[arg(long, value_enum, default_value = "ed25519")]
    pub scheme: KeyScheme,

    /// DID URL of the verification method, e.g. `did:btco:1#key-1`.
    #[arg(long)]
    pub verification_method: String,

    /// Path to the credential JSON file.
    #[arg(value_name = "FILE")]
    pub credential: PathBuf,

    /// Write the signed credential here instead of stdout.
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Execute the keygen subcommand.
pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create output directory: {}", args.output.display()))?;

    let (secret_hex, public_hex, multibase) = match args.scheme {
        KeyScheme::Ed25519 => {
            let pair = Ed25519KeyPair::generate();
            let public = pair.public_key();
            (pair.to_seed_hex(), public.to_hex(), public.to_multibase())
        }
        KeyScheme::Secp256k1 => {
            let pair = Secp256k1KeyPair::generate();
            let public = pair.public_key();
            (pair.to_secret_hex(), hex::encode(public.to_compressed()), public.to_multibase())
        }
    };

    let sk_path = args.output.join(format!("{}.key", args.prefix));
    let pk_path = args.output.join(format!("{}.pub", args.prefix));
    std::fs::write(&sk_path, secret_hex.as_bytes())
        .with_context(|| format!("failed to write private key: {}", sk_path.display()))?;
    std::fs::write(&pk_path, &public_hex)
        .with_context(|| format!("failed to write public key: {}", pk_path.display()))?;

    println!("OK: generated {:?} keypair", args.scheme);
    println!("  Private key: {}", sk_path.display());
    println!("  Public key:  {}", pk_path.display());
    println!("  publicKeyMultibase: {multibase}");
    Ok(0)
}

/// Execute the sign subcommand.
pub fn run_sign(args: &SignArgs) -> Result<u8> {
    let signed = sign_file(&args.key, args.scheme, &args.verification_method, &args.credential)?;
    let value = serde_json::to_value(&signed).context("failed to serialize credential")?;
    crate::write_json(&value, args.output.as_deref())?;
    Ok(0)
}

fn sign_file(
    key_path: &Path,
    scheme: KeyScheme,
    verification_method: &str,
    credential_path: &Path,
) -> Result<VerifiableCredential> {
    DidUrl::new(verification_method).context("invalid --verification-method")?;

    let key_hex = zeroize::Zeroizing::new(
        std::fs::read_to_string(key_path)
            .with_context(|| format!("failed to read private key: {}", key_path.display()))?,
    );
    let mut credential: VerifiableCredential = serde_json::from_value(crate::read_json(credential_path)?)
        .with_context(|| format!("not a verifiable credential: {}", credential_path.display()))?;

    let created = Some(Utc::now());
    match scheme {
        KeyScheme::Ed25519 => {
            let pair = Ed25519KeyPair::from_seed_hex(key_hex.trim()).context("invalid Ed25519 private key")?;
            credential.sign_ed25519(&pair, verification_method, created)
        }
        KeyScheme::Secp256k1 => {
            let pair =
                Secp256k1KeyPair::from_secret_hex(key_hex.trim()).context("invalid secp256k1 private key")?;
            credential.sign_secp256k1(&pair, verification_method, created)
        }
    }
    .context("failed to sign credential")?;
    Ok(credential)
}
