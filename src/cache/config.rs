//! Cache configuration.

use std::time::Duration;

/// Default time-to-live applied when an entry is stored without its own TTL.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Default period between background cleanup sweeps.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Configuration for a cache instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for entries stored without an explicit one.
    pub default_ttl: Duration,

    /// Maximum number of entries in the cache.
    /// When full, any insert evicts the least recently accessed entry first.
    /// `Some(0)` is treated as unbounded.
    pub max_size: Option<usize>,

    /// Count hits and misses.
    pub enable_stats: bool,

    /// Track access count and last access time on every live read.
    pub enable_access_tracking: bool,

    /// Period of the background sweep scheduled by the registry.
    pub auto_cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            max_size: None,
            enable_stats: true,
            enable_access_tracking: true,
            auto_cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with the given default TTL.
    pub fn with_ttl(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            ..Default::default()
        }
    }

    /// Set the default TTL (builder pattern).
    #[must_use]
    pub fn ttl(mut self, duration: Duration) -> Self {
        self.default_ttl = duration;
        self
    }

    /// Bound the cache to `max_size` entries.
    #[must_use]
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Enable or disable hit/miss counting.
    #[must_use]
    pub fn stats(mut self, enabled: bool) -> Self {
        self.enable_stats = enabled;
        self
    }

    /// Enable or disable access tracking on reads.
    #[must_use]
    pub fn access_tracking(mut self, enabled: bool) -> Self {
        self.enable_access_tracking = enabled;
        self
    }

    /// Set the background cleanup period.
    #[must_use]
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.auto_cleanup_interval = interval;
        self
    }

    /// Create config for listing endpoints that are cleared on every write.
    pub fn listing() -> Self {
        Self {
            default_ttl: Duration::from_secs(30),
            max_size: Some(500),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl, Duration::from_millis(30_000));
        assert_eq!(config.auto_cleanup_interval, Duration::from_millis(300_000));
        assert_eq!(config.max_size, None);
        assert!(config.enable_stats);
        assert!(config.enable_access_tracking);
    }

    #[test]
    fn test_builder_chain() {
        let config = CacheConfig::with_ttl(Duration::from_secs(5))
            .max_size(10)
            .stats(false)
            .access_tracking(false)
            .cleanup_interval(Duration::from_secs(1));

        assert_eq!(config.default_ttl, Duration::from_secs(5));
        assert_eq!(config.max_size, Some(10));
        assert!(!config.enable_stats);
        assert!(!config.enable_access_tracking);
        assert_eq!(config.auto_cleanup_interval, Duration::from_secs(1));
    }
}
