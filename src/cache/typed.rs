//! Typed, string-keyed cache with per-entry TTL and LRU eviction.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use super::clock::{duration_ms, Clock, SystemClock};
use super::entry::CacheEntry;
use super::stats::{hit_rate, CacheStats};
use super::CacheConfig;

/// A named cache holding values of one type under string keys.
///
/// This cache is:
/// - Thread-safe (a mutex guards entries and counters)
/// - Lazily expiring: stale entries are dropped when read, or by `cleanup()`
/// - Optionally size-bounded with least-recently-accessed eviction
/// - Clone-friendly (cloning is cheap, shares the same underlying store)
pub struct TypedCache<V>
where
    V: Clone + Serialize + Send + Sync + 'static,
{
    inner: Arc<Mutex<Store<V>>>,
    name: Arc<str>,
    config: Arc<CacheConfig>,
    clock: Arc<dyn Clock>,
}

struct Store<V> {
    entries: HashMap<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
}

impl<V> Store<V> {
    /// Drop the least recently accessed entry. Ties go to the smallest key.
    fn evict_lru(&mut self) -> Option<String> {
        let victim = self
            .entries
            .iter()
            .min_by(|(key_a, a), (key_b, b)| {
                a.last_accessed_at
                    .cmp(&b.last_accessed_at)
                    .then_with(|| key_a.cmp(key_b))
            })
            .map(|(key, _)| key.clone())?;

        self.entries.remove(&victim);
        Some(victim)
    }

    fn purge_expired(&mut self, now: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }
}

// Clones share the store; no value is copied
impl<V> Clone for TypedCache<V>
where
    V: Clone + Serialize + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            name: Arc::clone(&self.name),
            config: Arc::clone(&self.config),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<V> TypedCache<V>
where
    V: Clone + Serialize + Send + Sync + 'static,
{
    /// Create a new typed cache with the given name and config.
    pub fn new(name: impl Into<Arc<str>>, config: CacheConfig) -> Self {
        Self::with_clock(name, config, Arc::new(SystemClock))
    }

    /// Create a cache that reads time from `clock`.
    pub fn with_clock(
        name: impl Into<Arc<str>>,
        config: CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Store {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
            })),
            name: name.into(),
            config: Arc::new(config),
            clock,
        }
    }

    /// Get the name of this cache.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Insert a value with the cache's default TTL.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.insert(key.into(), value, self.config.default_ttl);
    }

    /// Insert a value that expires after `ttl`.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.insert(key.into(), value, ttl);
    }

    fn insert(&self, key: String, value: V, ttl: Duration) {
        let now = self.clock.now_ms();
        let mut store = self.inner.lock();

        // A limit of zero means unbounded
        if let Some(max_size) = self.config.max_size.filter(|&max| max > 0) {
            while store.entries.len() >= max_size {
                match store.evict_lru() {
                    Some(victim) => debug!("Cache '{}' evicted '{}'", self.name, victim),
                    None => break,
                }
            }
        }

        store
            .entries
            .insert(key, CacheEntry::new(value, now, duration_ms(ttl)));
    }

    /// Get a value from the cache.
    ///
    /// Returns `Some(value)` if the key exists and hasn't expired.
    /// An expired entry is removed and counted as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();
        let mut store = self.inner.lock();

        let live = match store.entries.get(key) {
            Some(entry) => !entry.is_expired(now),
            None => false,
        };

        if !live {
            store.entries.remove(key);
            if self.config.enable_stats {
                store.misses += 1;
            }
            return None;
        }

        if self.config.enable_stats {
            store.hits += 1;
        }

        let track = self.config.enable_access_tracking;
        store.entries.get_mut(key).map(|entry| {
            if track {
                entry.touch(now);
            }
            entry.data.clone()
        })
    }

    /// Check if a live entry exists without counting a lookup.
    ///
    /// An expired entry is removed.
    pub fn contains(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        let mut store = self.inner.lock();

        let expired = match store.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => return false,
        };

        if expired {
            store.entries.remove(key);
        }
        !expired
    }

    /// Remove a key from the cache.
    ///
    /// Returns `true` if an entry was removed.
    pub fn remove(&self, key: &str) -> bool {
        self.inner.lock().entries.remove(key).is_some()
    }

    /// Remove all entries from the cache. Counters are kept.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Remove every expired entry, returning how many were dropped.
    pub fn cleanup(&self) -> usize {
        let now = self.clock.now_ms();
        let removed = self.inner.lock().purge_expired(now);
        if removed > 0 {
            debug!("Cache '{}' cleaned up {} expired entries", self.name, removed);
        }
        removed
    }

    /// Live keys, sorted. Expired entries are purged first.
    pub fn keys(&self) -> Vec<String> {
        let now = self.clock.now_ms();
        let mut store = self.inner.lock();
        store.purge_expired(now);

        let mut keys: Vec<String> = store.entries.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Number of stored entries, including ones not yet purged.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of counters and entry statistics.
    pub fn stats(&self) -> CacheStats {
        let store = self.inner.lock();
        let entries = &store.entries;

        let total_memory_usage = entries
            .iter()
            .map(|(key, entry)| entry.estimated_size(key))
            .sum();
        let total_access: u64 = entries.values().map(|e| e.access_count).sum();
        let average_access_count = if entries.is_empty() {
            0.0
        } else {
            total_access as f64 / entries.len() as f64
        };

        CacheStats {
            total_keys: entries.len(),
            hit_count: store.hits,
            miss_count: store.misses,
            hit_rate: hit_rate(store.hits, store.misses),
            total_memory_usage,
            oldest_entry: entries.values().map(|e| e.stored_at).min(),
            newest_entry: entries.values().map(|e| e.stored_at).max(),
            average_access_count,
        }
    }

    /// Zero hit and miss counters. Entries are kept.
    pub fn reset_stats(&self) {
        let mut store = self.inner.lock();
        store.hits = 0;
        store.misses = 0;
    }

    /// Lengthen an entry's TTL without refreshing its insertion time.
    pub fn extend_ttl(&self, key: &str, additional: Duration) -> bool {
        match self.inner.lock().entries.get_mut(key) {
            Some(entry) => {
                entry.ttl_ms = entry.ttl_ms.saturating_add(duration_ms(additional));
                true
            }
            None => false,
        }
    }

    /// Replace an entry's TTL.
    pub fn update_ttl(&self, key: &str, ttl: Duration) -> bool {
        match self.inner.lock().entries.get_mut(key) {
            Some(entry) => {
                entry.ttl_ms = duration_ms(ttl);
                true
            }
            None => false,
        }
    }

    /// Get or insert a value using a closure.
    ///
    /// If the key is live, returns the cached value.
    /// Otherwise, calls the closure to compute the value, inserts it, and returns it.
    pub fn get_or_insert_with<F>(&self, key: &str, f: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(key) {
            return value;
        }
        let value = f();
        self.set(key, value.clone());
        value
    }
}

impl<V> std::fmt::Debug for TypedCache<V>
where
    V: Clone + Serialize + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedCache")
            .field("name", &self.name)
            .field("entry_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    const START: i64 = 1_700_000_000_000;

    fn cache_with(config: CacheConfig) -> (TypedCache<String>, ManualClock) {
        let clock = ManualClock::new(START);
        let cache = TypedCache::with_clock("test", config, Arc::new(clock.clone()));
        (cache, clock)
    }

    fn cache() -> (TypedCache<String>, ManualClock) {
        cache_with(CacheConfig::default())
    }

    #[test]
    fn test_set_then_get_is_a_hit() {
        let (cache, _) = cache();
        cache.set("k", "v".to_string());

        assert_eq!(cache.get("k"), Some("v".to_string()));
        let stats = cache.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 0);
        assert_eq!(stats.hit_rate, 1.0);
    }

    #[test]
    fn test_unknown_key_is_a_miss() {
        let (cache, _) = cache();
        assert_eq!(cache.get("missing"), None);
        assert_eq!(cache.stats().miss_count, 1);
        assert_eq!(cache.stats().hit_count, 0);
    }

    #[test]
    fn test_ttl_expiry() {
        let (cache, clock) = cache();
        cache.set_with_ttl("k", "v".to_string(), Duration::from_millis(100));

        clock.advance(Duration::from_millis(99));
        assert_eq!(cache.get("k"), Some("v".to_string()));

        clock.advance(Duration::from_millis(2));
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 0);
        assert!(!cache.contains("k"));
        assert!(cache.keys().is_empty());

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
    }

    #[test]
    fn test_default_ttl_applies() {
        let (cache, clock) = cache_with(CacheConfig::with_ttl(Duration::from_secs(1)));
        cache.set("k", "v".to_string());

        clock.advance(Duration::from_millis(1_000));
        assert!(cache.contains("k"));
        clock.advance(Duration::from_millis(1));
        assert!(!cache.contains("k"));
    }

    #[test]
    fn test_lru_eviction_prefers_least_recently_accessed() {
        let (cache, clock) = cache_with(CacheConfig::default().max_size(2));
        cache.set("a", "1".to_string());
        clock.advance(Duration::from_millis(1));
        cache.set("b", "2".to_string());
        clock.advance(Duration::from_millis(1));

        assert!(cache.get("a").is_some());
        clock.advance(Duration::from_millis(1));
        cache.set("c", "3".to_string());

        assert_eq!(cache.keys(), vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_lru_tie_breaks_on_smallest_key() {
        let (cache, _) = cache_with(CacheConfig::default().max_size(2));
        cache.set("b", "2".to_string());
        cache.set("a", "1".to_string());
        cache.set("c", "3".to_string());

        assert_eq!(cache.keys(), vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_overwrite_at_capacity_evicts_lru() {
        let (cache, clock) = cache_with(CacheConfig::default().max_size(2));
        cache.set("a", "1".to_string());
        clock.advance(Duration::from_millis(1));
        cache.set("b", "2".to_string());
        cache.set("b", "updated".to_string());

        assert_eq!(cache.keys(), vec!["b".to_string()]);
        assert_eq!(cache.get("b"), Some("updated".to_string()));
    }

    #[test]
    fn test_zero_max_size_is_unbounded() {
        let (cache, _) = cache_with(CacheConfig::default().max_size(0));
        cache.set("a", "1".to_string());
        cache.set("b", "2".to_string());
        cache.set("c", "3".to_string());

        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_access_tracking_disabled_keeps_insertion_order_for_eviction() {
        let config = CacheConfig::default().max_size(2).access_tracking(false);
        let (cache, clock) = cache_with(config);
        cache.set("a", "1".to_string());
        clock.advance(Duration::from_millis(1));
        cache.set("b", "2".to_string());
        clock.advance(Duration::from_millis(1));

        assert!(cache.get("a").is_some());
        cache.set("c", "3".to_string());

        assert_eq!(cache.keys(), vec!["b".to_string(), "c".to_string()]);
        assert_eq!(cache.stats().average_access_count, 0.0);
    }

    #[test]
    fn test_stats_disabled() {
        let (cache, _) = cache_with(CacheConfig::default().stats(false));
        cache.set("k", "v".to_string());
        cache.get("k");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 0);
        assert_eq!(stats.miss_count, 0);
        assert_eq!(stats.total_keys, 1);
    }

    #[test]
    fn test_contains_does_not_touch_counters_or_access() {
        let (cache, _) = cache();
        cache.set("k", "v".to_string());

        assert!(cache.contains("k"));
        assert!(!cache.contains("other"));

        let stats = cache.stats();
        assert_eq!(stats.requests(), 0);
        assert_eq!(stats.average_access_count, 0.0);
    }

    #[test]
    fn test_remove_and_clear() {
        let (cache, _) = cache();
        cache.set("a", "1".to_string());
        cache.set("b", "2".to_string());
        cache.get("a");

        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().hit_count, 1);
    }

    #[test]
    fn test_cleanup_removes_only_expired() {
        let (cache, clock) = cache();
        cache.set_with_ttl("short", "1".to_string(), Duration::from_millis(10));
        cache.set_with_ttl("long", "2".to_string(), Duration::from_millis(1_000));

        clock.advance(Duration::from_millis(20));
        assert_eq!(cache.cleanup(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().requests(), 0);
    }

    #[test]
    fn test_stats_entry_metadata() {
        let (cache, clock) = cache();
        assert_eq!(cache.stats().oldest_entry, None);
        assert_eq!(cache.stats().newest_entry, None);

        cache.set("a", "x".to_string());
        clock.advance(Duration::from_millis(50));
        cache.set("b", "y".to_string());
        cache.get("a");
        cache.get("a");

        let stats = cache.stats();
        assert_eq!(stats.total_keys, 2);
        assert_eq!(stats.oldest_entry, Some(START));
        assert_eq!(stats.newest_entry, Some(START + 50));
        assert_eq!(stats.average_access_count, 1.0);
        // each entry: 2 (key) + 6 ("\"x\"") + 64
        assert_eq!(stats.total_memory_usage, 2 * 72);
    }

    #[test]
    fn test_reset_stats_keeps_entries() {
        let (cache, _) = cache();
        cache.set("a", "1".to_string());
        cache.get("a");
        cache.get("b");

        cache.reset_stats();
        let stats = cache.stats();
        assert_eq!(stats.hit_count, 0);
        assert_eq!(stats.miss_count, 0);
        assert_eq!(stats.total_keys, 1);
        assert_eq!(cache.get("a"), Some("1".to_string()));
    }

    #[test]
    fn test_extend_ttl() {
        let (cache, clock) = cache();
        cache.set_with_ttl("k", "v".to_string(), Duration::from_millis(100));

        assert!(cache.extend_ttl("k", Duration::from_millis(100)));
        assert!(!cache.extend_ttl("missing", Duration::from_millis(100)));

        clock.advance(Duration::from_millis(150));
        assert!(cache.contains("k"));
        clock.advance(Duration::from_millis(51));
        assert!(!cache.contains("k"));
    }

    #[test]
    fn test_update_ttl() {
        let (cache, clock) = cache();
        cache.set_with_ttl("k", "v".to_string(), Duration::from_secs(60));

        assert!(cache.update_ttl("k", Duration::from_millis(10)));
        assert!(!cache.update_ttl("missing", Duration::from_millis(10)));

        clock.advance(Duration::from_millis(11));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_get_or_insert_with() {
        let (cache, _) = cache();
        let mut calls = 0;

        let first = cache.get_or_insert_with("k", || {
            calls += 1;
            "computed".to_string()
        });
        let second = cache.get_or_insert_with("k", || {
            calls += 1;
            "again".to_string()
        });

        assert_eq!(first, "computed");
        assert_eq!(second, "computed");
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_clones_share_store() {
        let (cache, _) = cache();
        let other = cache.clone();
        other.set("k", "v".to_string());

        assert_eq!(cache.get("k"), Some("v".to_string()));
        assert_eq!(other.stats().hit_count, 1);
    }
}
