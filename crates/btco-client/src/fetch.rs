//! Cached JSON resource fetching.
//!
//! `GET <url>` through the [`ResilientClient`], with successful results
//! stored in the [`ResourceCache`]. Anything other than `200 OK` with a JSON
//! body is a failure, and failures are never cached.

use std::sync::Arc;

use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde_json::Value;

use btco_core::codes;

use crate::cache::ResourceCache;
use crate::error::ClientError;
use crate::resilient::ResilientClient;

/// Fetches JSON documents through the cache and the resilient client.
#[derive(Debug, Clone)]
pub struct ResourceFetcher {
    client: Arc<ResilientClient>,
    cache: Arc<ResourceCache>,
}

impl ResourceFetcher {
    pub fn new(client: Arc<ResilientClient>, cache: Arc<ResourceCache>) -> Self {
        Self { client, cache }
    }

    /// The shared cache.
    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    /// The shared client.
    pub fn client(&self) -> &Arc<ResilientClient> {
        &self.client
    }

    /// Fetch `url` as JSON, serving from cache while fresh.
    pub async fn fetch_json(&self, url: &str) -> Result<Arc<Value>, ClientError> {
        self.fetch(url, None).await
    }

    /// Fetch `url` with an explicit `Accept` media type.
    ///
    /// Negotiated representations are cached under `"<accept> <url>"` so they
    /// never shadow the default representation of the same URL.
    pub async fn fetch_json_as(&self, url: &str, accept: &str) -> Result<Arc<Value>, ClientError> {
        self.fetch(url, Some(accept)).await
    }

    async fn fetch(&self, url: &str, accept: Option<&str>) -> Result<Arc<Value>, ClientError> {
        let key = match accept {
            Some(media) => format!("{media} {url}"),
            None => url.to_string(),
        };
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(url, "resource cache hit");
            return Ok(hit);
        }
        tracing::debug!(url, "resource cache miss");

        let endpoint = format!("GET {url}");
        let resp = self
            .client
            .execute(&endpoint, || {
                let req = self.client.http().get(url);
                match accept {
                    Some(media) => req.header(ACCEPT, media),
                    None => req.header(ACCEPT, "application/json"),
                }
            })
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(ClientError::Api {
                endpoint,
                code: codes::FETCH_FAILED.to_string(),
                status: Some(status.as_u16()),
                message: format!("expected 200 OK, got {status}"),
            });
        }
        let value: Value = resp.json(&endpoint)?;
        Ok(self.cache.insert(&key, value))
    }
}
