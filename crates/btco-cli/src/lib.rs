//! # btco-cli — Command-Line Interface for the Trust Engine
//!
//! Provides the `btco` binary.
//!
//! ## Subcommands
//!
//! - `btco verify`: Verify a credential file against DID Documents on disk
//!   or a DID resolver endpoint.
//! - `btco issue`: Issue a collectible credential through the issuance API.
//! - `btco health`: Probe the issuance API health endpoint.
//! - `btco keygen`: Generate an Ed25519 or secp256k1 keypair.
//! - `btco sign`: Attach a Data Integrity proof to a credential.
//! - `btco status-list`: Build and encode a revocation/status bitstring.
//!
//! ```bash
//! btco keygen --scheme ed25519 --prefix issuer
//! btco sign --key issuer.key --verification-method did:btco:1#key-1 vc.json
//! btco verify vc.json --did-document issuer-did.json
//! btco status-list --length 131072 --set 42 --format status-2021
//! ```
//!
//! Every handler returns `anyhow::Result<u8>`: the `u8` is the process exit
//! code (0 ok, 1 invalid), and `Err` is reported by `main` with exit code 1.

pub mod health;
pub mod issue;
pub mod keys;
pub mod status_list;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Read and parse a JSON file.
pub fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse JSON: {}", path.display()))
}

/// Write `value` as pretty JSON to `path`, or to stdout when `path` is `None`.
pub fn write_json(value: &Value, path: Option<&Path>) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to serialize JSON")?;
    match path {
        Some(path) => std::fs::write(path, format!("{rendered}\n"))
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}
