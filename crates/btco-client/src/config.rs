//! Trust engine configuration.
//!
//! Loaded from `BTCO_*` environment variables, or built explicitly for tests
//! with [`TrustEngineConfig::local`].

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use btco_core::Did;
use url::Url;
use zeroize::Zeroizing;

use crate::breaker::BreakerConfig;
use crate::retry::RetryPolicy;

/// Default issuance API base URL.
pub const DEFAULT_ISSUANCE_API_URL: &str = "http://127.0.0.1:3000";

/// Upper bound on a single backoff delay.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Configuration for the outbound call stack and the issuance API.
///
/// Custom `Debug` redacts `api_key`.
#[derive(Clone)]
pub struct TrustEngineConfig {
    /// Base URL of the external issuance API.
    pub issuance_api_url: Url,
    /// Bearer token sent to the issuance API. `None` sends no
    /// `Authorization` header.
    pub api_key: Option<Zeroizing<String>>,
    /// The platform's own DID, used as the default issuer.
    pub platform_did: Option<Did>,
    /// Universal-resolver style DID resolution endpoint.
    pub resolver_url: Option<Url>,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// First backoff delay in milliseconds; doubles per retry.
    pub retry_base_delay_ms: u64,
    /// Consecutive failures that open the circuit breaker.
    pub breaker_failure_threshold: u32,
    /// Milliseconds the breaker stays open before a half-open trial.
    pub breaker_reset_timeout_ms: u64,
    /// Resource cache time-to-live in seconds.
    pub cache_ttl_secs: u64,
    /// Force debug-level logging.
    pub debug_logging: bool,
}

impl std::fmt::Debug for TrustEngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustEngineConfig")
            .field("issuance_api_url", &self.issuance_api_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("platform_did", &self.platform_did)
            .field("resolver_url", &self.resolver_url.as_ref().map(Url::as_str))
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("breaker_failure_threshold", &self.breaker_failure_threshold)
            .field("breaker_reset_timeout_ms", &self.breaker_reset_timeout_ms)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("debug_logging", &self.debug_logging)
            .finish()
    }
}

impl TrustEngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `BTCO_ISSUANCE_API_URL` (default: `http://127.0.0.1:3000`)
    /// - `BTCO_API_KEY` (optional)
    /// - `BTCO_PLATFORM_DID` (optional)
    /// - `BTCO_RESOLVER_URL` (optional)
    /// - `BTCO_REQUEST_TIMEOUT_MS` (default: 30000)
    /// - `BTCO_MAX_RETRIES` (default: 3)
    /// - `BTCO_RETRY_BASE_DELAY_MS` (default: 200)
    /// - `BTCO_BREAKER_FAILURE_THRESHOLD` (default: 5)
    /// - `BTCO_BREAKER_RESET_TIMEOUT_MS` (default: 30000)
    /// - `BTCO_CACHE_TTL_SECS` (default: 300)
    /// - `BTCO_DEBUG` (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration from an explicit variable map.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|var| vars.get(var).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = Self {
            issuance_api_url: parse_url(
                "BTCO_ISSUANCE_API_URL",
                &lookup("BTCO_ISSUANCE_API_URL").unwrap_or_else(|| DEFAULT_ISSUANCE_API_URL.into()),
            )?,
            api_key: lookup("BTCO_API_KEY")
                .filter(|k| !k.is_empty())
                .map(Zeroizing::new),
            platform_did: lookup("BTCO_PLATFORM_DID")
                .map(|raw| {
                    Did::new(raw).map_err(|e| ConfigError::InvalidValue("BTCO_PLATFORM_DID".into(), e.to_string()))
                })
                .transpose()?,
            resolver_url: lookup("BTCO_RESOLVER_URL")
                .map(|raw| parse_url("BTCO_RESOLVER_URL", &raw))
                .transpose()?,
            request_timeout_ms: parse_or(&lookup, "BTCO_REQUEST_TIMEOUT_MS", 30_000)?,
            max_retries: parse_or(&lookup, "BTCO_MAX_RETRIES", 3)?,
            retry_base_delay_ms: parse_or(&lookup, "BTCO_RETRY_BASE_DELAY_MS", 200)?,
            breaker_failure_threshold: parse_or(&lookup, "BTCO_BREAKER_FAILURE_THRESHOLD", 5)?,
            breaker_reset_timeout_ms: parse_or(&lookup, "BTCO_BREAKER_RESET_TIMEOUT_MS", 30_000)?,
            cache_ttl_secs: parse_or(&lookup, "BTCO_CACHE_TTL_SECS", 300)?,
            debug_logging: lookup("BTCO_DEBUG")
                .map(|raw| parse_bool("BTCO_DEBUG", &raw))
                .transpose()?
                .unwrap_or(false),
        };
        config.validate()?;
        Ok(config)
    }

    /// A configuration pointing at a local mock server, with fast retries.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `base_url` cannot be parsed.
    pub fn local(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            issuance_api_url: parse_url("issuance_api_url", base_url)?,
            api_key: None,
            platform_did: None,
            resolver_url: None,
            request_timeout_ms: 2_000,
            max_retries: 2,
            retry_base_delay_ms: 10,
            breaker_failure_threshold: 5,
            breaker_reset_timeout_ms: 30_000,
            cache_ttl_secs: 300,
            debug_logging: false,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.breaker_failure_threshold == 0 {
            return Err(ConfigError::InvalidValue(
                "BTCO_BREAKER_FAILURE_THRESHOLD".into(),
                "must be at least 1".into(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "BTCO_REQUEST_TIMEOUT_MS".into(),
                "must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Resource cache time-to-live.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// The retry policy these settings describe.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: MAX_RETRY_DELAY,
        }
    }

    /// The breaker settings these settings describe.
    pub fn breaker_config(&self) -> BreakerConfig {
        BreakerConfig {
            failure_threshold: self.breaker_failure_threshold,
            reset_timeout: Duration::from_millis(self.breaker_reset_timeout_ms),
        }
    }
}

fn parse_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidValue(var.to_string(), e.to_string()))
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, var: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(var.to_string(), e.to_string())),
        None => Ok(default),
    }
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue(
            var.to_string(),
            format!("expected a boolean, got {other:?}"),
        )),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}
