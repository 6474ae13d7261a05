//! # btco CLI entry point
//!
//! Parses command-line arguments, initializes logging and dispatches to
//! subcommand handlers. Network subcommands load their settings from
//! `BTCO_*` environment variables.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use btco_cli::health::run_health;
use btco_cli::issue::{run_issue, IssueArgs};
use btco_cli::keys::{run_keygen, run_sign, KeygenArgs, SignArgs};
use btco_cli::status_list::{run_status_list, StatusListArgs};
use btco_cli::verify::{run_verify, VerifyArgs};
use btco_client::{ConfigError, TrustEngineConfig};

/// Verifiable credential trust engine.
///
/// Verifies and issues W3C Verifiable Credentials for inscription-based
/// collectibles, manages signing keys and encodes revocation lists.
#[derive(Parser, Debug)]
#[command(name = "btco", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify a credential: structure, issuer, signature, expiry and status.
    Verify(VerifyArgs),

    /// Issue a collectible credential through the issuance API.
    Issue(IssueArgs),

    /// Check that the issuance API is healthy.
    Health,

    /// Generate an Ed25519 or secp256k1 keypair.
    Keygen(KeygenArgs),

    /// Attach a Data Integrity proof to a credential.
    Sign(SignArgs),

    /// Build and encode a revocation or status list.
    StatusList(StatusListArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = TrustEngineConfig::from_env();

    let debug = config.as_ref().map(|c| c.debug_logging).unwrap_or(false);
    init_tracing(log_level(cli.verbose, debug), cli.log_json);

    tracing::debug!("btco CLI v{} starting", env!("CARGO_PKG_VERSION"));

    match dispatch(cli.command, config).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn dispatch(command: Commands, config: Result<TrustEngineConfig, ConfigError>) -> Result<u8> {
    match command {
        Commands::Verify(args) => run_verify(&args, &required(config)?).await,
        Commands::Issue(args) => run_issue(&args, &required(config)?).await,
        Commands::Health => run_health(&required(config)?).await,
        Commands::Keygen(args) => run_keygen(&args),
        Commands::Sign(args) => run_sign(&args),
        Commands::StatusList(args) => run_status_list(&args),
    }
}

fn required(config: Result<TrustEngineConfig, ConfigError>) -> Result<TrustEngineConfig> {
    let config = config.context("invalid BTCO_* configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

/// `BTCO_DEBUG` raises the level to at least debug.
fn log_level(verbose: u8, debug: bool) -> &'static str {
    match (verbose, debug) {
        (0, false) => "warn",
        (1, false) => "info",
        (0..=2, _) => "debug",
        _ => "trace",
    }
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::new(level);
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}
