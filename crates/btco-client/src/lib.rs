//! # btco-client — Resilient Outbound Calls
//!
//! Every network call the trust engine makes goes through this crate:
//!
//! - [`ResilientClient`] composes per-request timeouts, bounded retry with
//!   exponential backoff, and a [`CircuitBreaker`].
//! - [`ResourceFetcher`] serves JSON resources (status lists, DID documents)
//!   from a URL-keyed TTL [`ResourceCache`], fetching on miss.
//! - [`IssuanceApiClient`] wraps the external issuance API.
//!
//! Breakers and caches are plain values owned by whoever constructs them and
//! are passed to consumers explicitly. There is no process-global state, so
//! tests build isolated instances.
//!
//! ## Crate Policy
//!
//! - Depends only on `btco-core` internally.
//! - No lock is held across an `.await`.

pub mod breaker;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod issuance;
pub mod resilient;
pub mod retry;

pub use breaker::{Admission, BreakerConfig, BreakerState, CircuitBreaker};
pub use cache::{CacheEntry, ResourceCache};
pub use config::{ConfigError, TrustEngineConfig};
pub use error::ClientError;
pub use fetch::ResourceFetcher;
pub use issuance::IssuanceApiClient;
pub use resilient::{BufferedResponse, ResilientClient};
pub use retry::{RetryEvent, RetryObserver, RetryPolicy};
