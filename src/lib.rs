//! Cachekeep - in-memory TTL caches managed by a named registry.
//!
//! ## Architecture
//!
//! - `cache` - Typed TTL/LRU caches, the registry that owns them, stats and health
//! - `config` - Environment configuration
//! - `tasks` - Task repository reading through the registry with clear-on-write

pub mod cache;
pub mod config;
pub mod tasks;
