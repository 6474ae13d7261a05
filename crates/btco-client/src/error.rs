//! Outbound call error taxonomy.
//!
//! | Variant       | Cause                                 | Retried | Breaker failure |
//! |---------------|---------------------------------------|---------|-----------------|
//! | `Network`     | transport failure or timeout          | yes     | yes             |
//! | `Server`      | upstream 5xx                          | yes     | yes             |
//! | `Api`         | 4xx, non-200 fetch, bad body, app code | no      | no              |
//! | `CircuitOpen` | breaker open, no request was sent     | no      | no              |

use std::time::Duration;

use btco_core::codes;

/// Errors from calls made through [`ResilientClient`](crate::ResilientClient).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure, including timeouts.
    #[error("network error calling {endpoint}: {source}")]
    Network {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The upstream answered with a 5xx status.
    #[error("{endpoint} returned server error {status}: {body}")]
    Server {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Non-retryable application error carrying a machine-readable code.
    #[error("{endpoint} failed with {code}: {message}")]
    Api {
        endpoint: String,
        code: String,
        status: Option<u16>,
        message: String,
    },
    /// Raised without any network attempt while the breaker is open.
    #[error("circuit open for {endpoint}; retry in {retry_after:?}")]
    CircuitOpen {
        endpoint: String,
        retry_after: Duration,
    },
}

impl ClientError {
    /// Build an [`ClientError::Api`] from a 4xx response.
    pub fn http(endpoint: &str, status: u16, body: String) -> Self {
        Self::Api {
            endpoint: endpoint.to_string(),
            code: codes::HTTP_ERROR.to_string(),
            status: Some(status),
            message: body,
        }
    }

    /// Build an [`ClientError::Api`] for a body that does not match the
    /// expected shape.
    pub fn invalid_response(endpoint: &str, message: impl Into<String>) -> Self {
        Self::Api {
            endpoint: endpoint.to_string(),
            code: codes::INVALID_RESPONSE.to_string(),
            status: None,
            message: message.into(),
        }
    }

    /// Network and server errors are transient and retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Server { .. })
    }

    /// The machine-readable code, for `Api` errors.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// The endpoint label the error was raised for.
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Network { endpoint, .. }
            | Self::Server { endpoint, .. }
            | Self::Api { endpoint, .. }
            | Self::CircuitOpen { endpoint, .. } => endpoint,
        }
    }
}
