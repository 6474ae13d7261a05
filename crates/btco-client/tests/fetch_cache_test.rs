//! Cached resource fetching.

use std::sync::Arc;
use std::time::Duration;

use btco_client::{ClientError, ResilientClient, ResourceCache, ResourceFetcher, TrustEngineConfig};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(server: &MockServer, ttl: Duration) -> ResourceFetcher {
    let mut cfg = TrustEngineConfig::local(&server.uri()).unwrap();
    cfg.max_retries = 0;
    let client = Arc::new(ResilientClient::from_config(&cfg).unwrap());
    ResourceFetcher::new(client, Arc::new(ResourceCache::new(ttl)))
}

#[tokio::test]
async fn second_fetch_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lists/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"encodedList": "AAAA"})))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(&server, Duration::from_secs(300));
    let url = format!("{}/lists/1", server.uri());
    let first = fetcher.fetch_json(&url).await.unwrap();
    let second = fetcher.fetch_json(&url).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(second["encodedList"], "AAAA");
}

#[tokio::test]
async fn expired_entries_are_refetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"v": 1})))
        .expect(2)
        .mount(&server)
        .await;

    let fetcher = fetcher(&server, Duration::ZERO);
    let url = format!("{}/doc", server.uri());
    fetcher.fetch_json(&url).await.unwrap();
    fetcher.fetch_json(&url).await.unwrap();
}

#[tokio::test]
async fn non_200_is_a_failure_and_never_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&server)
        .await;

    let fetcher = fetcher(&server, Duration::from_secs(300));
    let url = format!("{}/doc", server.uri());
    for _ in 0..2 {
        let err = fetcher.fetch_json(&url).await.unwrap_err();
        assert_eq!(err.code(), Some("FETCH_FAILED"));
    }
    assert!(fetcher.cache().is_empty());
}

#[tokio::test]
async fn non_json_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let fetcher = fetcher(&server, Duration::from_secs(300));
    let err = fetcher
        .fetch_json(&format!("{}/doc", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { ref code, .. } if code == "INVALID_RESPONSE"));
    assert!(fetcher.cache().is_empty());
}

#[tokio::test]
async fn negotiated_representation_is_cached_separately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("accept", "application/did+ld+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "did:example:issuer"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"didDocument": null})))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(&server, Duration::from_secs(300));
    let url = format!("{}/1.0/identifiers/did:example:issuer", server.uri());
    let doc = fetcher.fetch_json_as(&url, "application/did+ld+json").await.unwrap();
    let result = fetcher.fetch_json(&url).await.unwrap();
    assert_eq!(doc["id"], "did:example:issuer");
    assert!(result["didDocument"].is_null());
    assert_eq!(fetcher.cache().len(), 2);
}
