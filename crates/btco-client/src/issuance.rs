//! Typed client for the external issuance API.
//!
//! | Method | Path               | Body                          | Response                         |
//! |--------|--------------------|-------------------------------|----------------------------------|
//! | POST   | `/issueCredential` | `{credential, issuerDid}`     | `{data: VerifiableCredential}`   |
//! | GET    | `/health`          |                               | `{status: "ok"}`                 |
//!
//! A `2xx` body carrying `{"error": {"code", "message"}}` or missing `data`
//! is an application-level failure and surfaces as [`ClientError::Api`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;
use zeroize::Zeroizing;

use btco_core::{codes, Did};

use crate::config::TrustEngineConfig;
use crate::error::ClientError;
use crate::resilient::ResilientClient;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IssueCredentialRequest<'a> {
    credential: &'a Value,
    issuer_did: &'a Did,
}

#[derive(Debug, Deserialize)]
struct IssueCredentialResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<ApiFailure>,
}

#[derive(Debug, Deserialize)]
struct ApiFailure {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

/// Client for the issuance API.
#[derive(Clone)]
pub struct IssuanceApiClient {
    client: Arc<ResilientClient>,
    base_url: Url,
    api_key: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for IssuanceApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuanceApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl IssuanceApiClient {
    pub fn new(client: Arc<ResilientClient>, config: &TrustEngineConfig) -> Self {
        Self {
            client,
            base_url: config.issuance_api_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// The resilient client used for every call.
    pub fn client(&self) -> &Arc<ResilientClient> {
        &self.client
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key.as_str()),
            None => req,
        }
    }

    /// Submit an unsigned credential for signing by `issuer_did`.
    ///
    /// Returns the signed credential document exactly as the API returned it.
    pub async fn issue_credential(&self, credential: &Value, issuer_did: &Did) -> Result<Value, ClientError> {
        let endpoint = "POST /issueCredential";
        let url = self.url("issueCredential");
        let body = IssueCredentialRequest {
            credential,
            issuer_did,
        };

        let resp = self
            .client
            .execute(endpoint, || self.authorize(self.client.http().post(&url).json(&body)))
            .await?;

        let parsed: IssueCredentialResponse = resp.json(endpoint)?;

        if let Some(failure) = parsed.error {
            return Err(ClientError::Api {
                endpoint: endpoint.to_string(),
                code: failure
                    .code
                    .unwrap_or_else(|| codes::CREDENTIAL_ISSUANCE_ERROR.to_string()),
                status: None,
                message: failure.message.unwrap_or_default(),
            });
        }
        match parsed.data {
            Some(Value::Object(map)) => Ok(Value::Object(map)),
            Some(_) => Err(ClientError::invalid_response(endpoint, "'data' is not an object")),
            None => Err(ClientError::invalid_response(endpoint, "response has no 'data'")),
        }
    }

    /// `true` only for `200 {"status": "ok"}`.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let endpoint = "GET /health";
        let url = self.url("health");
        let resp = self
            .client
            .execute(endpoint, || self.authorize(self.client.http().get(&url)))
            .await?;
        if resp.status() != reqwest::StatusCode::OK {
            return Ok(false);
        }
        let health: HealthResponse = resp.json(endpoint)?;
        Ok(health.status == "ok")
    }
}
