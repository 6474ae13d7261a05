//! # Resource Cache
//!
//! TTL cache of JSON documents keyed by URL, shared by every verification in
//! the process.
//!
//! - Entries are immutable once written and replaced wholesale on refetch.
//! - Expiry is checked lazily on read; nothing is evicted in the background.
//! - Only successful fetches are inserted.
//! - Concurrent writers race as last-write-wins. Duplicate concurrent
//!   fetches of the same URL are allowed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde_json::Value;

/// Default time-to-live for cached resources.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// A cached document and the time it was fetched.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    data: Arc<Value>,
    fetched_at: Instant,
}

impl CacheEntry {
    /// The cached document.
    pub fn data(&self) -> &Arc<Value> {
        &self.data
    }

    /// When the document was fetched.
    pub fn fetched_at(&self) -> Instant {
        self.fetched_at
    }

    /// Whether the entry is still within `ttl` at `now`.
    pub fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

/// URL-keyed TTL cache.
#[derive(Debug)]
pub struct ResourceCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ResourceCache {
    /// Create an empty cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return a fresh entry for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Arc<Value>> {
        self.get_at(key, Instant::now())
    }

    /// [`get`](Self::get) against an explicit clock reading.
    pub fn get_at(&self, key: &str, now: Instant) -> Option<Arc<Value>> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(self.ttl, now))
            .map(|entry| entry.data.clone())
    }

    /// Store a freshly fetched document, replacing any previous entry.
    pub fn insert(&self, key: &str, data: Value) -> Arc<Value> {
        self.insert_at(key, data, Instant::now())
    }

    /// [`insert`](Self::insert) with an explicit fetch time.
    pub fn insert_at(&self, key: &str, data: Value, fetched_at: Instant) -> Arc<Value> {
        let data = Arc::new(data);
        self.entries.write().insert(
            key.to_string(),
            CacheEntry {
                data: data.clone(),
                fetched_at,
            },
        );
        data
    }

    /// Drop the entry for `key`. Returns whether one existed.
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of stored entries, fresh or stale.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://status.example/list/1";

    #[test]
    fn hit_within_ttl() {
        let cache = ResourceCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.insert_at(URL, json!({"n": 1}), t0);
        let hit = cache.get_at(URL, t0 + Duration::from_secs(59)).unwrap();
        assert_eq!(*hit, json!({"n": 1}));
    }

    #[test]
    fn stale_after_ttl_but_not_evicted() {
        let cache = ResourceCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.insert_at(URL, json!({"n": 1}), t0);
        assert!(cache.get_at(URL, t0 + Duration::from_secs(60)).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn refetch_replaces_entry() {
        let cache = ResourceCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.insert_at(URL, json!({"n": 1}), t0);
        let t1 = t0 + Duration::from_secs(120);
        cache.insert_at(URL, json!({"n": 2}), t1);
        assert_eq!(*cache.get_at(URL, t1).unwrap(), json!({"n": 2}));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn zero_ttl_never_hits() {
        let cache = ResourceCache::new(Duration::ZERO);
        cache.insert(URL, json!(true));
        assert!(cache.get(URL).is_none());
    }

    #[test]
    fn invalidate_and_clear() {
        let cache = ResourceCache::default();
        cache.insert("a", json!(1));
        cache.insert("b", json!(2));
        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
