//! Cache module - TTL caches coordinated by a named registry.
//!
//! ## Architecture
//!
//! The cache system follows a registry pattern:
//! - `TypedCache` - String-keyed store with per-entry TTL, LRU eviction and hit/miss stats
//! - `CacheRegistry` - Central registry holding all named caches, their
//!   cleanup schedules and warmers
//! - Individual caches are created per dataset (tasks, projects, users, ...)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cachekeep::cache::{CacheConfig, CacheRegistry, TypedCache};
//!
//! let registry = CacheRegistry::new();
//!
//! // Create a cache for tasks
//! let tasks: TypedCache<String> = registry
//!     .get_or_create("tasks", CacheConfig::default())
//!     .unwrap();
//!
//! // Use the cache
//! tasks.set("task:1", "Write docs".to_string());
//! let task = tasks.get("task:1");
//!
//! // Clear it after the underlying data changes
//! tasks.clear();
//! ```

mod cleanup;
mod clock;
mod config;
mod entry;
mod error;
mod health;
mod registry;
mod stats;
mod typed;

pub use cleanup::CleanupTask;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, DEFAULT_CLEANUP_INTERVAL, DEFAULT_TTL};
pub use entry::CacheEntry;
pub use error::CacheError;
pub use health::{HealthInfo, HealthThresholds};
pub use registry::{
    CacheRegistry, ManagedCache, RegisterOptions, RegistryConfig, WarmFailure, WarmReport,
};
pub use stats::{CacheStats, GlobalStats};
pub use typed::TypedCache;
