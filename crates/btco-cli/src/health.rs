//! # Health Subcommand
//!
//! Probes `GET {BTCO_ISSUANCE_API_URL}/health`. Exit code 0 only for
//! `200 {"status": "ok"}`.

use std::sync::Arc;

use anyhow::{Context, Result};

use btco_client::{IssuanceApiClient, ResilientClient, TrustEngineConfig};

/// Execute the health subcommand.
pub async fn run_health(config: &TrustEngineConfig) -> Result<u8> {
    let client = ResilientClient::from_config(config).context("failed to build HTTP client")?;
    let api = IssuanceApiClient::new(Arc::new(client), config);

    match api.health().await {
        Ok(true) => {
            println!("OK: issuance API at {} is healthy", config.issuance_api_url);
            Ok(0)
        }
        Ok(false) => {
            println!("FAIL: issuance API at {} reports unhealthy", config.issuance_api_url);
            Ok(1)
        }
        Err(e) => {
            println!("FAIL: issuance API unreachable: {e}");
            Ok(1)
        }
    }
}
