//! Response cache: time-bounded memoization of upstream JSON keyed by resource + identifier.
//!
//! At most `ttl` stale. No size bound and no LRU; expired entries are treated as absent
//! and overwritten by the next fetch for the same key.

use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::time::Instant;

/// Default time-to-live for cached responses.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Value,
    stored_at: Instant,
}

/// Builds the cache key for `resource` scoped to `id`, e.g. `products_42`.
pub fn cache_key(resource: &str, id: &str) -> String {
    format!("{}_{}", resource, id)
}

/// In-memory cache of parsed upstream responses.
///
/// **Interaction**: Owned by `SettingsClient`; consulted before a request enters the
/// limiter and filled after a successful parse.
#[derive(Debug)]
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value while it is younger than the TTL.
    pub fn get(&self, key: &str) -> Option<Value> {
        let entry = self.entries.get(key)?;
        if entry.stored_at.elapsed() < self.ttl {
            Some(entry.data.clone())
        } else {
            None
        }
    }

    /// Stores (or overwrites) `key`, stamping it with the current time.
    pub fn set(&self, key: impl Into<String>, data: Value) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                data,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry. Used when upstream caches are purged.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_joins_resource_and_id() {
        assert_eq!(cache_key("products", "42"), "products_42");
    }

    #[tokio::test(start_paused = true)]
    async fn hit_within_ttl_miss_after() {
        let cache = ResponseCache::new(Duration::from_millis(30_000));
        cache.set(cache_key("brands", "1"), json!([{"id": 1}]));

        tokio::time::advance(Duration::from_millis(29_999)).await;
        assert_eq!(cache.get("brands_1"), Some(json!([{"id": 1}])));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get("brands_1"), None);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn set_after_expiry_refreshes_timestamp() {
        let cache = ResponseCache::new(Duration::from_secs(1));
        cache.set("categories_1", json!([]));
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("categories_1").is_none());

        cache.set("categories_1", json!([{"id": 3}]));
        assert_eq!(cache.get("categories_1"), Some(json!([{"id": 3}])));
    }

    #[test]
    fn keys_are_independent_and_clear_empties() {
        let cache = ResponseCache::default();
        cache.set("products_1", json!({"products": []}));
        cache.set("products_2", json!({"products": [1]}));
        assert_eq!(cache.get("products_2"), Some(json!({"products": [1]})));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("products_1").is_none());
    }
}
