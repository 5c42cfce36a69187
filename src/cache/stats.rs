//! Usage statistics for single caches and the whole registry.

use std::collections::BTreeMap;

use serde::Serialize;

/// Snapshot of one cache's usage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total_keys: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub hit_rate: f64,
    /// Estimated bytes held by keys and values.
    pub total_memory_usage: usize,
    /// Earliest `stored_at` among current entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_entry: Option<i64>,
    /// Latest `stored_at` among current entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_entry: Option<i64>,
    pub average_access_count: f64,
}

impl CacheStats {
    /// Total lookups recorded.
    pub fn requests(&self) -> u64 {
        self.hit_count + self.miss_count
    }
}

/// Totals across every registered cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_caches: usize,
    pub total_keys: usize,
    pub total_hits: u64,
    pub total_misses: u64,
    pub global_hit_rate: f64,
    pub total_memory_usage: usize,
    pub caches: BTreeMap<String, CacheStats>,
}

impl GlobalStats {
    /// Aggregate per-cache snapshots.
    pub fn from_caches(caches: BTreeMap<String, CacheStats>) -> Self {
        let mut global = Self {
            total_caches: caches.len(),
            ..Default::default()
        };

        for stats in caches.values() {
            global.total_keys += stats.total_keys;
            global.total_hits += stats.hit_count;
            global.total_misses += stats.miss_count;
            global.total_memory_usage += stats.total_memory_usage;
        }

        global.global_hit_rate = hit_rate(global.total_hits, global.total_misses);
        global.caches = caches;
        global
    }

    pub fn requests(&self) -> u64 {
        self.total_hits + self.total_misses
    }
}

/// `hits / (hits + misses)`, or 0 when nothing was looked up.
pub fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}
