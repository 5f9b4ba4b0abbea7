//! Memory Cache Module
//!
//! Process-lifetime map of cache key to entry with TTL expiration.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

use crate::cache::{current_timestamp_ms, generate_key, CacheEntry, CacheParams, MemoryStats};

// == Memory Cache ==
/// In-memory cache tier.
///
/// Expired entries are treated as absent on read and reclaimed by
/// [`cleanup`](Self::cleanup). No operation here can fail.
#[derive(Debug)]
pub struct MemoryCache<T = Value> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// Lookups that returned data
    hits: u64,
    /// Lookups that found nothing usable
    misses: u64,
}

impl<T: Clone> MemoryCache<T> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    // == Get ==
    /// Returns the data cached for `url` + `params` if still valid.
    pub fn get(&mut self, url: &str, params: &CacheParams) -> Option<T> {
        self.get_key(&generate_key(url, params))
    }

    /// Looks up by a precomputed cache key.
    pub fn get_key(&mut self, key: &str) -> Option<T> {
        let now = current_timestamp_ms();
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                self.hits += 1;
                Some(entry.data.clone())
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    /// Valid data under `key` without touching the hit/miss counters.
    pub fn peek_key(&self, key: &str) -> Option<T> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(current_timestamp_ms()))
            .map(|entry| entry.data.clone())
    }

    // == Set ==
    /// Stores `data` for `url` + `params`, replacing any prior entry.
    pub fn set(&mut self, url: &str, params: &CacheParams, data: T, ttl: Duration) {
        self.set_key(generate_key(url, params), data, ttl);
    }

    /// Stores under a precomputed cache key.
    pub fn set_key(&mut self, key: String, data: T, ttl: Duration) {
        self.entries.insert(key, CacheEntry::new(data, ttl));
    }

    // == Invalidate ==
    /// Removes the exact entry. Returns whether anything was removed.
    pub fn invalidate(&mut self, url: &str, params: &CacheParams) -> bool {
        self.invalidate_key(&generate_key(url, params))
    }

    pub fn invalidate_key(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Removes every entry whose key contains `pattern`.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_pattern(&mut self, pattern: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.contains(pattern));
        before - self.entries.len()
    }

    // == Clear ==
    /// Removes every entry and resets the hit/miss counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    // == Cleanup ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup(&mut self) -> usize {
        let now = current_timestamp_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        before - self.entries.len()
    }

    // == Stats ==
    /// Returns a snapshot of the tier. `pending` is filled in by the owner of
    /// the request deduplicator.
    pub fn stats(&self) -> MemoryStats {
        let now = current_timestamp_ms();
        let expired = self
            .entries
            .values()
            .filter(|entry| entry.is_expired_at(now))
            .count();

        MemoryStats {
            total: self.entries.len(),
            valid: self.entries.len() - expired,
            expired,
            pending: 0,
            hits: self.hits,
            misses: self.misses,
        }
    }

    /// Cache keys currently stored, valid or not.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> Default for MemoryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;

    const TTL: Duration = Duration::from_secs(300);

    fn page(n: u64) -> CacheParams {
        let mut params = CacheParams::new();
        params.insert("page".to_string(), json!(n));
        params
    }

    #[test]
    fn test_cache_new() {
        let cache: MemoryCache = MemoryCache::new();
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_and_get() {
        let mut cache = MemoryCache::new();

        cache.set("/jobs", &page(1), json!(["a", "b"]), TTL);

        assert_eq!(cache.get("/jobs", &page(1)), Some(json!(["a", "b"])));
        assert_eq!(cache.get("/jobs", &page(2)), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_overwrite() {
        let mut cache = MemoryCache::new();

        cache.set("/jobs", &page(1), "first", TTL);
        cache.set("/jobs", &page(1), "second", TTL);

        assert_eq!(cache.get("/jobs", &page(1)), Some("second"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_peek_leaves_counters_alone() {
        let mut cache = MemoryCache::new();
        cache.set("/jobs", &CacheParams::new(), 7, TTL);

        let key = generate_key("/jobs", &CacheParams::new());
        assert_eq!(cache.peek_key(&key), Some(7));
        assert_eq!(cache.peek_key("/missing"), None);

        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_ttl_expiration() {
        let mut cache = MemoryCache::new();

        cache.set("/jobs", &CacheParams::new(), 1, Duration::from_millis(50));
        assert_eq!(cache.get("/jobs", &CacheParams::new()), Some(1));

        sleep(Duration::from_millis(80));

        assert_eq!(cache.get("/jobs", &CacheParams::new()), None);
        // Lookup does not evict; the sweep does
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.cleanup(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_exact() {
        let mut cache = MemoryCache::new();

        cache.set("/jobs", &page(1), 1, TTL);
        cache.set("/jobs", &page(2), 2, TTL);

        assert!(cache.invalidate("/jobs", &page(1)));
        assert!(!cache.invalidate("/jobs", &page(1)));
        assert_eq!(cache.get("/jobs", &page(2)), Some(2));
    }

    #[test]
    fn test_invalidate_pattern() {
        let mut cache = MemoryCache::new();
        let none = CacheParams::new();

        cache.set("/jobs", &none, 1, TTL);
        cache.set("/jobs/1", &none, 2, TTL);
        cache.set("/articles", &none, 3, TTL);

        assert_eq!(cache.invalidate_pattern("/jobs"), 2);
        assert_eq!(cache.get("/articles", &none), Some(3));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cleanup_keeps_valid_entries() {
        let mut cache = MemoryCache::new();
        let none = CacheParams::new();

        cache.set("/short", &none, 1, Duration::from_millis(30));
        cache.set("/long", &none, 2, Duration::from_secs(10));

        sleep(Duration::from_millis(60));

        assert_eq!(cache.cleanup(), 1);
        assert_eq!(cache.get("/long", &none), Some(2));
    }

    #[test]
    fn test_stats() {
        let mut cache = MemoryCache::new();
        let none = CacheParams::new();

        cache.set("/a", &none, 1, TTL);
        cache.set("/b", &none, 2, Duration::from_millis(0));
        cache.get("/a", &none); // hit
        cache.get("/missing", &none); // miss

        let stats = cache.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.valid, 1);
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_clear_twice() {
        let mut cache = MemoryCache::new();
        cache.set("/a", &CacheParams::new(), 1, TTL);

        cache.clear();
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.stats(), MemoryStats::default());
    }
}
