//! Configuration module for cachekeep.
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::cache::{CacheConfig, HealthThresholds, RegistryConfig};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL for caches created without their own.
    pub default_ttl: Duration,

    /// Period of the background sweep for each cache.
    pub cleanup_interval: Duration,

    /// Schedule background sweeps at all.
    /// Set `CACHE_AUTO_CLEANUP=false` for tests and one-shot tools.
    pub auto_cleanup: bool,

    /// Optional entry limit applied to every cache.
    pub max_size: Option<usize>,

    /// How often the binary logs stats and health.
    pub report_interval: Duration,

    pub health: HealthThresholds,
}

impl Default for Config {
    fn default() -> Self {
        let cache = CacheConfig::default();
        Self {
            default_ttl: cache.default_ttl,
            cleanup_interval: cache.auto_cleanup_interval,
            auto_cleanup: true,
            max_size: None,
            report_interval: Duration::from_secs(60),
            health: HealthThresholds::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset variables fall back to defaults; malformed ones are errors.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = Self {
            default_ttl: parse_var("CACHE_DEFAULT_TTL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.default_ttl),
            cleanup_interval: parse_var("CACHE_CLEANUP_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.cleanup_interval),
            auto_cleanup: parse_var("CACHE_AUTO_CLEANUP")?.unwrap_or(defaults.auto_cleanup),
            max_size: parse_var("CACHE_MAX_SIZE")?,
            report_interval: parse_var("CACHE_REPORT_INTERVAL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.report_interval),
            health: HealthThresholds {
                min_global_hit_rate: parse_var("CACHE_HEALTH_MIN_HIT_RATE")?
                    .unwrap_or(defaults.health.min_global_hit_rate),
                max_memory_bytes: parse_var("CACHE_HEALTH_MAX_MEMORY_BYTES")?
                    .unwrap_or(defaults.health.max_memory_bytes),
                min_cache_hit_rate: parse_var("CACHE_HEALTH_MIN_CACHE_HIT_RATE")?
                    .unwrap_or(defaults.health.min_cache_hit_rate),
                min_requests: parse_var("CACHE_HEALTH_MIN_REQUESTS")?
                    .unwrap_or(defaults.health.min_requests),
            },
        };

        if config.report_interval.is_zero() {
            bail!("CACHE_REPORT_INTERVAL_SECS must be greater than zero");
        }

        Ok(config)
    }

    /// Settings for the cache registry.
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            auto_cleanup: self.auto_cleanup,
            health: self.health.clone(),
            ..Default::default()
        }
    }

    /// Per-cache defaults derived from this configuration.
    pub fn cache_config(&self) -> CacheConfig {
        let config =
            CacheConfig::with_ttl(self.default_ttl).cleanup_interval(self.cleanup_interval);
        match self.max_size {
            Some(max_size) => config.max_size(max_size),
            None => config,
        }
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} has an invalid value: {:?}", name, raw)),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_unset_is_none() {
        let value: Option<u64> = parse_var("CACHEKEEP_TEST_SURELY_UNSET").unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_cache_config_applies_max_size() {
        let config = Config {
            default_ttl: Duration::from_secs(10),
            max_size: Some(50),
            ..Default::default()
        };

        let cache = config.cache_config();
        assert_eq!(cache.default_ttl, Duration::from_secs(10));
        assert_eq!(cache.max_size, Some(50));
        assert_eq!(cache.auto_cleanup_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_registry_config_carries_switch() {
        let config = Config {
            auto_cleanup: false,
            ..Default::default()
        };
        let registry = config.registry_config();
        assert!(!registry.auto_cleanup);
        assert_eq!(registry.health, HealthThresholds::default());
    }
}
