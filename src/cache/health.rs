//! Health diagnostics derived from registry statistics.

use serde::Serialize;

use super::stats::GlobalStats;

const MIB: usize = 1024 * 1024;

/// Limits below/above which the registry reports an issue.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthThresholds {
    /// Minimum acceptable hit rate across all caches.
    pub min_global_hit_rate: f64,
    /// Maximum estimated memory across all caches.
    pub max_memory_bytes: usize,
    /// Minimum acceptable hit rate of any single cache.
    pub min_cache_hit_rate: f64,
    /// Lookups a cache (or the registry) must have served before its hit
    /// rate is judged. Zero judges idle caches too, at a hit rate of 0.
    pub min_requests: u64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            min_global_hit_rate: 0.5,
            max_memory_bytes: 50 * MIB,
            min_cache_hit_rate: 0.3,
            min_requests: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HealthInfo {
    pub healthy: bool,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

impl HealthInfo {
    /// Evaluate `stats` against `thresholds`.
    ///
    /// Hit-rate checks only apply once `thresholds.min_requests` lookups
    /// have been served.
    pub fn evaluate(stats: &GlobalStats, thresholds: &HealthThresholds) -> Self {
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();

        if stats.requests() >= thresholds.min_requests
            && stats.global_hit_rate < thresholds.min_global_hit_rate
        {
            issues.push(format!(
                "Low global cache hit rate: {:.1}%",
                stats.global_hit_rate * 100.0
            ));
            recommendations.push(
                "Consider increasing cache TTL values or warming frequently used caches"
                    .to_string(),
            );
        }

        if stats.total_memory_usage > thresholds.max_memory_bytes {
            issues.push(format!(
                "High cache memory usage: {:.1} MiB",
                stats.total_memory_usage as f64 / MIB as f64
            ));
            recommendations.push(
                "Consider lowering max cache sizes or shortening cleanup intervals".to_string(),
            );
        }

        for (name, cache) in &stats.caches {
            if cache.requests() >= thresholds.min_requests
                && cache.hit_rate < thresholds.min_cache_hit_rate
            {
                issues.push(format!(
                    "Cache '{}' has low hit rate: {:.1}%",
                    name,
                    cache.hit_rate * 100.0
                ));
                recommendations.push(format!("Review caching strategy for '{}'", name));
            }
        }

        Self {
            healthy: issues.is_empty(),
            issues,
            recommendations,
        }
    }
}
