//! # DID Resolution
//!
//! The verifier resolves issuer DIDs through the [`DidResolver`] trait. A
//! general resolution may return content that is not a DID Document (a
//! resolver can serve other representations for a DID), so the trait has a
//! second, narrower entry point that asks for the DID Document form only.
//!
//! Two implementations ship here:
//!
//! - [`StaticDidResolver`]: an in-memory map, for tests, offline
//!   verification and the CLI's `--did-document` flag.
//! - [`HttpDidResolver`]: universal-resolver style
//!   `GET {base}/1.0/identifiers/{did}`, through the shared
//!   [`ResourceFetcher`] so results are cached and calls are guarded by the
//!   circuit breaker.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use url::Url;

use btco_client::ResourceFetcher;

use crate::document::is_did_document;
use crate::error::ResolutionError;

/// Media type of a JSON-LD DID Document.
pub const DID_LD_JSON: &str = "application/did+ld+json";

/// Outcome of a resolution call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DidResolutionResult {
    /// The resolved content. Not necessarily a DID Document; check with
    /// [`DidResolutionResult::document`].
    pub did_document: Option<Value>,
    pub content_type: Option<String>,
    /// Resolver-reported error, e.g. `notFound`.
    pub error: Option<String>,
}

impl DidResolutionResult {
    pub fn found(document: Value) -> Self {
        Self {
            did_document: Some(document),
            content_type: Some(DID_LD_JSON.to_string()),
            error: None,
        }
    }

    /// The content, if it is a DID Document and no error was reported.
    pub fn document(&self) -> Option<&Value> {
        if self.error.is_some() {
            return None;
        }
        self.did_document.as_ref().filter(|doc| is_did_document(doc))
    }
}

/// External DID resolution collaborator.
#[async_trait]
pub trait DidResolver: Send + Sync {
    /// General resolution. May yield non-document content.
    async fn resolve(&self, did: &str) -> Result<DidResolutionResult, ResolutionError>;

    /// Resolution restricted to the DID Document representation.
    async fn resolve_did_document(&self, did: &str) -> Result<DidResolutionResult, ResolutionError>;
}

/// In-memory resolver.
#[derive(Debug, Default)]
pub struct StaticDidResolver {
    documents: RwLock<HashMap<String, Value>>,
    other_content: RwLock<HashMap<String, (String, Value)>>,
}

impl StaticDidResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DID Document under its own `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::Malformed`] if `document` has no DID `id`.
    pub fn insert(&self, document: Value) -> Result<(), ResolutionError> {
        let id = document
            .get("id")
            .and_then(Value::as_str)
            .filter(|_| is_did_document(&document))
            .ok_or_else(|| ResolutionError::Malformed("document has no DID id".into()))?
            .to_string();
        self.documents.write().insert(id, document);
        Ok(())
    }

    /// Make general resolution of `did` return `content` instead of the
    /// document. `resolve_did_document` still returns the document.
    pub fn insert_other_content(&self, did: &str, content_type: &str, content: Value) {
        self.other_content
            .write()
            .insert(did.to_string(), (content_type.to_string(), content));
    }

    fn document(&self, did: &str) -> Result<DidResolutionResult, ResolutionError> {
        self.documents
            .read()
            .get(did)
            .cloned()
            .map(DidResolutionResult::found)
            .ok_or_else(|| ResolutionError::NotFound(did.to_string()))
    }
}

#[async_trait]
impl DidResolver for StaticDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidResolutionResult, ResolutionError> {
        let other = self.other_content.read().get(did).cloned();
        if let Some((content_type, content)) = other {
            return Ok(DidResolutionResult {
                did_document: Some(content),
                content_type: Some(content_type),
                error: None,
            });
        }
        self.document(did)
    }

    async fn resolve_did_document(&self, did: &str) -> Result<DidResolutionResult, ResolutionError> {
        self.document(did)
    }
}

/// Universal-resolver HTTP client.
#[derive(Debug, Clone)]
pub struct HttpDidResolver {
    base_url: Url,
    fetcher: ResourceFetcher,
}

impl HttpDidResolver {
    pub fn new(base_url: Url, fetcher: ResourceFetcher) -> Self {
        Self { base_url, fetcher }
    }

    fn url(&self, did: &str) -> String {
        format!(
            "{}/1.0/identifiers/{did}",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

/// Interpret a resolver response body: either a resolution result
/// envelope or a bare DID Document.
fn parse_resolution(body: &Value) -> Result<DidResolutionResult, ResolutionError> {
    if is_did_document(body) {
        return Ok(DidResolutionResult::found(body.clone()));
    }
    let obj = body
        .as_object()
        .ok_or_else(|| ResolutionError::Malformed("response is not a JSON object".into()))?;
    let metadata = obj.get("didResolutionMetadata");
    let field = |name: &str| {
        metadata
            .and_then(|m| m.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    Ok(DidResolutionResult {
        did_document: obj.get("didDocument").filter(|v| !v.is_null()).cloned(),
        content_type: field("contentType"),
        error: field("error"),
    })
}

#[async_trait]
impl DidResolver for HttpDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidResolutionResult, ResolutionError> {
        let body = self.fetcher.fetch_json(&self.url(did)).await?;
        parse_resolution(&body)
    }

    async fn resolve_did_document(&self, did: &str) -> Result<DidResolutionResult, ResolutionError> {
        let body = self.fetcher.fetch_json_as(&self.url(did), DID_LD_JSON).await?;
        parse_resolution(&body)
    }
}
