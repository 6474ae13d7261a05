//! # Resilient Client
//!
//! Every outbound call in the trust engine goes through
//! [`ResilientClient::execute`], which composes three guards:
//!
//! 1. The [`CircuitBreaker`] is consulted before each attempt. While it is
//!    open the call fails with [`ClientError::CircuitOpen`] and no request is
//!    sent.
//! 2. Each attempt carries the configured per-request timeout. A timeout is a
//!    [`ClientError::Network`] failure.
//! 3. Transient failures are retried with exponential backoff up to the
//!    policy bound; the last error is returned once retries are exhausted.
//!
//! The breaker counts attempts, not calls: each transient failure increments
//! the consecutive-failure counter, while success and 4xx responses reset it.
//!
//! An attempt ends only once the response body has been read, so a timeout
//! or reset mid-body is a retried [`ClientError::Network`] failure like any
//! other transport error.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::breaker::{BreakerConfig, CircuitBreaker};
use crate::config::TrustEngineConfig;
use crate::error::ClientError;
use crate::retry::{log_retry, RetryEvent, RetryObserver, RetryPolicy};

#[derive(Debug, Clone, Copy)]
struct CallSettings {
    retry: RetryPolicy,
    timeout: Duration,
}

/// A response whose body was read within the attempt that produced it.
#[derive(Debug, Clone)]
pub struct BufferedResponse {
    status: StatusCode,
    body: Vec<u8>,
}

impl BufferedResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Parse the body as JSON. A body of the wrong shape is `INVALID_RESPONSE`.
    pub fn json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body).map_err(|e| ClientError::invalid_response(endpoint, e.to_string()))
    }
}

/// HTTP client wrapper with retry, timeout, and circuit breaking.
pub struct ResilientClient {
    http: reqwest::Client,
    settings: RwLock<CallSettings>,
    breaker: CircuitBreaker,
    observer: RetryObserver,
}

impl std::fmt::Debug for ResilientClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientClient")
            .field("settings", &*self.settings.read())
            .field("breaker", &self.breaker.state())
            .finish_non_exhaustive()
    }
}

impl ResilientClient {
    /// Create a client with explicit policies.
    pub fn new(
        http: reqwest::Client,
        retry: RetryPolicy,
        breaker: BreakerConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            settings: RwLock::new(CallSettings { retry, timeout }),
            breaker: CircuitBreaker::new(breaker),
            observer: Arc::new(log_retry),
        }
    }

    /// Create a client from loaded configuration.
    pub fn from_config(config: &TrustEngineConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("btco/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Network {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self::new(
            http,
            config.retry_policy(),
            config.breaker_config(),
            config.request_timeout(),
        ))
    }

    /// Replace the retry observer.
    pub fn with_observer(mut self, observer: RetryObserver) -> Self {
        self.observer = observer;
        self
    }

    /// The underlying `reqwest` client, for building requests.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The breaker guarding this client.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Apply reloaded configuration. Resets the breaker to `Closed`.
    pub fn reconfigure(&self, config: &TrustEngineConfig) {
        *self.settings.write() = CallSettings {
            retry: config.retry_policy(),
            timeout: config.request_timeout(),
        };
        self.breaker.reconfigure(config.breaker_config());
    }

    /// Send a request built by `build`, retrying transient failures.
    ///
    /// `build` is called once per attempt. `endpoint` is a label such as
    /// `"POST /issueCredential"` used in errors and logs. Any 2xx response is
    /// returned with its body buffered; callers decide whether other 2xx
    /// codes are acceptable.
    pub async fn execute<F>(&self, endpoint: &str, build: F) -> Result<BufferedResponse, ClientError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let settings = *self.settings.read();
        let mut retry = 0u32;
        loop {
            let admission = match self.breaker.try_acquire() {
                Ok(admission) => admission,
                Err(retry_after) => {
                    return Err(ClientError::CircuitOpen {
                        endpoint: endpoint.to_string(),
                        retry_after,
                    })
                }
            };

            let err = match send_once(endpoint, build().timeout(settings.timeout)).await {
                Ok(resp) => {
                    self.breaker.record_success(admission);
                    return Ok(resp);
                }
                Err(err) if err.is_retryable() => {
                    self.breaker.record_failure(admission);
                    err
                }
                Err(err) => {
                    self.breaker.record_success(admission);
                    return Err(err);
                }
            };

            if retry >= settings.retry.max_retries {
                return Err(err);
            }
            let delay = settings.retry.delay_for(retry);
            retry += 1;
            (self.observer)(&RetryEvent {
                endpoint,
                attempt: retry,
                max_retries: settings.retry.max_retries,
                error: &err,
                delay,
            });
            tokio::time::sleep(delay).await;
        }
    }
}

async fn send_once(endpoint: &str, request: reqwest::RequestBuilder) -> Result<BufferedResponse, ClientError> {
    let network = |e: reqwest::Error| ClientError::Network {
        endpoint: endpoint.to_string(),
        source: e,
    };
    let resp = request.send().await.map_err(network)?;
    let status = resp.status();
    if status.is_success() {
        let body = resp.bytes().await.map_err(network)?;
        return Ok(BufferedResponse {
            status,
            body: body.to_vec(),
        });
    }
    let body = resp.text().await.unwrap_or_default();
    if status.is_server_error() {
        Err(ClientError::Server {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        })
    } else {
        Err(ClientError::http(endpoint, status.as_u16(), body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn transport_failures_exhaust_retries_and_notify_observer() {
        let seen = Arc::new(AtomicU32::new(0));
        let counter = seen.clone();
        let client = ResilientClient::new(
            reqwest::Client::new(),
            RetryPolicy {
                max_retries: 2,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
            },
            BreakerConfig {
                failure_threshold: 100,
                reset_timeout: Duration::from_secs(60),
            },
            Duration::from_millis(200),
        )
        .with_observer(Arc::new(move |event: &RetryEvent<'_>| {
            assert!(event.error.is_retryable());
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        // Closed port: connection refused.
        let result = client
            .execute("GET /", || client.http().get("http://127.0.0.1:1/"))
            .await;

        assert!(matches!(result, Err(ClientError::Network { .. })));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(client.breaker().consecutive_failures(), 3);
    }
}
