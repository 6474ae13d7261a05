//! # Status List Subcommand
//!
//! Builds a revocation/status bitstring with the given indices set and
//! prints its `encodedList`. With `--id` and `--issuer` it prints a complete
//! unsigned list credential instead, ready for `btco sign`.
//!
//! Bit order is most-significant-bit first: index 0 is the high bit of the
//! first byte.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use serde_json::{json, Value};

use btco_core::Did;
use btco_vc::Bitstring;

/// Wire format of the encoded list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// RevocationList2020: plain base64.
    #[value(name = "revocation-2020")]
    RevocationList2020,
    /// StatusList2021: gzip, then base64url.
    #[value(name = "status-2021")]
    StatusList2021,
}

/// Arguments for the `btco status-list` subcommand.
#[derive(Args, Debug)]
pub struct StatusListArgs {
    /// List length in bits (rounded up to a whole byte).
    #[arg(long)]
    pub length: usize,

    /// Index to mark revoked/suspended. Repeatable.
    #[arg(long = "set", value_name = "INDEX")]
    pub set: Vec<u64>,

    #[arg(long, value_enum, default_value = "status-2021")]
    pub format: ListFormat,

    /// `statusPurpose` of a StatusList2021 credential.
    #[arg(long, default_value = "revocation")]
    pub purpose: String,

    /// URL the list credential will be published at.
    #[arg(long, requires = "issuer")]
    pub id: Option<String>,

    /// Issuer of the list credential.
    #[arg(long, requires = "id")]
    pub issuer: Option<Did>,

    /// Write the output here instead of stdout.
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Execute the status-list subcommand.
pub fn run_status_list(args: &StatusListArgs) -> Result<u8> {
    let encoded = encode(args.length, &args.set, args.format)?;

    match (&args.id, &args.issuer) {
        (Some(id), Some(issuer)) => {
            let credential = list_credential(id, issuer, &encoded, args.format, &args.purpose);
            crate::write_json(&credential, args.output.as_deref())?;
        }
        _ => match &args.output {
            Some(path) => std::fs::write(path, format!("{encoded}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?,
            None => println!("{encoded}"),
        },
    }
    Ok(0)
}

/// Encode a list of `length` bits with `set` indices marked.
pub fn encode(length: usize, set: &[u64], format: ListFormat) -> Result<String> {
    if length == 0 {
        bail!("--length must be at least 1");
    }
    let mut bits = Bitstring::new(length);
    for &index in set {
        if index >= length as u64 {
            bail!("index {index} is outside a list of {length} bits");
        }
        bits.set(index, true)?;
    }
    Ok(match format {
        ListFormat::RevocationList2020 => bits.encode_base64(),
        ListFormat::StatusList2021 => bits.encode_gzip_base64url()?,
    })
}

fn list_credential(id: &str, issuer: &Did, encoded: &str, format: ListFormat, purpose: &str) -> Value {
    let issued = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let subject_id = format!("{id}#list");
    match format {
        ListFormat::RevocationList2020 => json!({
            "@context": [
                "https://www.w3.org/2018/credentials/v1",
                "https://w3id.org/vc-revocation-list-2020/v1",
            ],
            "id": id,
            "type": ["VerifiableCredential", "RevocationList2020Credential"],
            "issuer": issuer.as_str(),
            "issuanceDate": issued,
            "credentialSubject": {
                "id": subject_id,
                "type": "RevocationList2020",
                "encodedList": encoded,
            },
        }),
        ListFormat::StatusList2021 => json!({
            "@context": [
                "https://www.w3.org/2018/credentials/v1",
                "https://w3id.org/vc/status-list/2021/v1",
            ],
            "id": id,
            "type": ["VerifiableCredential", "StatusList2021Credential"],
            "issuer": issuer.as_str(),
            "issuanceDate": issued,
            "credentialSubject": {
                "id": subject_id,
                "type": "StatusList2021",
                "statusPurpose": purpose,
                "encodedList": encoded,
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revocation_list_bits_decode() {
        let encoded = encode(16, &[0, 9], ListFormat::RevocationList2020).unwrap();
        let bits = Bitstring::decode_base64(&encoded).unwrap();
        assert_eq!(bits.as_bytes(), &[0b1000_0000, 0b0100_0000]);
    }

    #[test]
    fn status_list_bits_decode() {
        let encoded = encode(131_072, &[42], ListFormat::StatusList2021).unwrap();
        let bits = Bitstring::decode_gzip_base64url(&encoded).unwrap();
        assert_eq!(bits.len(), 131_072);
        assert_eq!(bits.get(42), Some(true));
        assert_eq!(bits.get(41), Some(false));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        assert!(encode(8, &[8], ListFormat::RevocationList2020).is_err());
        assert!(encode(0, &[], ListFormat::StatusList2021).is_err());
    }

    #[test]
    fn list_credential_carries_purpose_and_list() {
        let issuer = Did::new("did:btco:5").unwrap();
        let vc = list_credential(
            "https://status.example/1",
            &issuer,
            "H4sI",
            ListFormat::StatusList2021,
            "suspension",
        );
        assert_eq!(vc["credentialSubject"]["statusPurpose"], "suspension");
        assert_eq!(vc["credentialSubject"]["encodedList"], "H4sI");
        assert_eq!(vc["issuer"], "did:btco:5");
    }

    #[test]
    fn encoded_list_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("list.txt");
        let args = StatusListArgs {
            length: 8,
            set: vec![7],
            format: ListFormat::RevocationList2020,
            purpose: "revocation".into(),
            id: None,
            issuer: None,
            output: Some(out.clone()),
        };
        assert_eq!(run_status_list(&args).unwrap(), 0);
        assert_eq!(std::fs::read_to_string(out).unwrap().trim(), "AQ==");
    }
}
