//! Cache registry - Central management for all caches.

use std::any::{type_name, Any};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use parking_lot::RwLock;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::cleanup::CleanupTask;
use super::clock::{Clock, SystemClock};
use super::config::DEFAULT_CLEANUP_INTERVAL;
use super::health::{HealthInfo, HealthThresholds};
use super::stats::{CacheStats, GlobalStats};
use super::{CacheConfig, CacheError, TypedCache};

/// Type-erased view of a cache, used for bulk operations.
pub trait ManagedCache: Send + Sync {
    fn name(&self) -> &str;
    fn clear(&self);
    fn cleanup(&self) -> usize;
    fn keys(&self) -> Vec<String>;
    fn remove(&self, key: &str) -> bool;
    fn stats(&self) -> CacheStats;
    fn reset_stats(&self);
}

impl<V> ManagedCache for TypedCache<V>
where
    V: Clone + Serialize + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        TypedCache::name(self)
    }

    fn clear(&self) {
        TypedCache::clear(self)
    }

    fn cleanup(&self) -> usize {
        TypedCache::cleanup(self)
    }

    fn keys(&self) -> Vec<String> {
        TypedCache::keys(self)
    }

    fn remove(&self, key: &str) -> bool {
        TypedCache::remove(self, key)
    }

    fn stats(&self) -> CacheStats {
        TypedCache::stats(self)
    }

    fn reset_stats(&self) {
        TypedCache::reset_stats(self)
    }
}

/// Produces a value to seed a cache with.
type Producer<V> = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<V>> + Send + Sync>;

/// Runs a producer and stores its value.
type Warmer = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Options for [`CacheRegistry::register`].
pub struct RegisterOptions<V> {
    auto_cleanup: bool,
    cleanup_interval: Duration,
    warmer: Option<Producer<V>>,
}

impl<V> Default for RegisterOptions<V> {
    fn default() -> Self {
        Self {
            auto_cleanup: true,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            warmer: None,
        }
    }
}

impl<V> RegisterOptions<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule periodic cleanup (default: on).
    #[must_use]
    pub fn auto_cleanup(mut self, enabled: bool) -> Self {
        self.auto_cleanup = enabled;
        self
    }

    /// Period between scheduled sweeps (default: 5 minutes).
    #[must_use]
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Function used by [`CacheRegistry::warm_caches`] to seed the cache.
    #[must_use]
    pub fn warmer<F, Fut>(mut self, produce: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let producer: Producer<V> = Arc::new(move || produce().boxed());
        self.warmer = Some(producer);
        self
    }
}

/// Registry-wide settings.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Master switch for scheduled cleanup. Off in tests and short-lived tools.
    pub auto_cleanup: bool,
    pub health: HealthThresholds,
    /// Time source for caches created by the registry and for warm keys.
    pub clock: Arc<dyn Clock>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            auto_cleanup: true,
            health: HealthThresholds::default(),
            clock: Arc::new(SystemClock),
        }
    }
}

/// Outcome of [`CacheRegistry::warm_caches`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WarmReport {
    pub warmed: Vec<String>,
    pub failed: Vec<WarmFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarmFailure {
    pub cache: String,
    pub error: String,
}

/// Central registry for managing multiple typed caches.
///
/// The registry allows collaborators to create and access their own caches
/// by name, and runs the operations that span all of them: scheduled
/// cleanup, bulk clear, pattern invalidation, statistics and warming.
///
/// ## Example
///
/// ```rust,no_run
/// use cachekeep::cache::{CacheConfig, CacheRegistry, TypedCache};
///
/// let registry = CacheRegistry::new();
///
/// // Create a cache for task lists
/// let tasks: TypedCache<Vec<String>> = registry
///     .get_or_create("tasks", CacheConfig::default())
///     .unwrap();
///
/// // Later, retrieve the same cache
/// let tasks: Option<TypedCache<Vec<String>>> = registry.get("tasks").unwrap();
/// ```
#[derive(Clone)]
pub struct CacheRegistry {
    caches: Arc<RwLock<HashMap<String, Registration>>>,
    config: Arc<RegistryConfig>,
}

/// Internal entry storing a type-erased cache and its schedule.
struct Registration {
    cache: Arc<dyn ManagedCache>,
    typed: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
    cleanup: Option<CleanupTask>,
    warmer: Option<Warmer>,
}

impl Registration {
    fn downcast<V>(&self, name: &str) -> Result<TypedCache<V>, CacheError>
    where
        V: Clone + Serialize + Send + Sync + 'static,
    {
        self.typed
            .downcast_ref::<TypedCache<V>>()
            .cloned()
            .ok_or_else(|| CacheError::TypeMismatch {
                name: name.to_string(),
                expected: type_name::<TypedCache<V>>(),
                found: self.type_name,
            })
    }

    /// Cancel the schedule and drop the warmer.
    fn detach(&mut self) {
        if let Some(task) = self.cleanup.take() {
            task.cancel();
        }
        self.warmer = None;
    }
}

impl CacheRegistry {
    /// Create a new empty cache registry.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        info!(
            "Cache registry initialized (auto cleanup: {})",
            config.auto_cleanup
        );
        Self {
            caches: Arc::new(RwLock::new(HashMap::new())),
            config: Arc::new(config),
        }
    }

    /// Get an existing cache by name.
    ///
    /// Returns `Ok(None)` if the cache doesn't exist and an error if it
    /// exists with a different value type.
    pub fn get<V>(&self, name: &str) -> Result<Option<TypedCache<V>>, CacheError>
    where
        V: Clone + Serialize + Send + Sync + 'static,
    {
        let caches = self.caches.read();
        caches.get(name).map(|entry| entry.downcast(name)).transpose()
    }

    /// Get an existing cache or create a new one if it doesn't exist.
    ///
    /// This is the recommended way for collaborators to access caches. A new
    /// cache is swept every `config.auto_cleanup_interval`. Once a name is
    /// registered, `config` is ignored on later calls.
    pub fn get_or_create<V>(
        &self,
        name: &str,
        config: CacheConfig,
    ) -> Result<TypedCache<V>, CacheError>
    where
        V: Clone + Serialize + Send + Sync + 'static,
    {
        let mut caches = self.caches.write();

        if let Some(existing) = caches.get(name) {
            return existing.downcast(name);
        }

        debug!("Creating cache: {}", name);

        let options = RegisterOptions::new().cleanup_interval(config.auto_cleanup_interval);
        let cache = TypedCache::with_clock(name, config, Arc::clone(&self.config.clock));
        caches.insert(name.to_string(), self.registration(cache.clone(), options));

        Ok(cache)
    }

    /// Attach an externally built cache under `name`.
    ///
    /// A cache already registered under `name` is replaced and its schedule
    /// cancelled.
    pub fn register<V>(&self, name: &str, cache: TypedCache<V>, options: RegisterOptions<V>)
    where
        V: Clone + Serialize + Send + Sync + 'static,
    {
        let registration = self.registration(cache, options);
        let previous = self.caches.write().insert(name.to_string(), registration);

        match previous {
            Some(mut old) => {
                old.detach();
                debug!("Replaced cache: {}", name);
            }
            None => debug!("Registered cache: {}", name),
        }
    }

    fn registration<V>(&self, cache: TypedCache<V>, options: RegisterOptions<V>) -> Registration
    where
        V: Clone + Serialize + Send + Sync + 'static,
    {
        let managed: Arc<dyn ManagedCache> = Arc::new(cache.clone());

        let cleanup = if options.auto_cleanup && self.config.auto_cleanup {
            CleanupTask::spawn(Arc::clone(&managed), options.cleanup_interval)
        } else {
            None
        };

        let warmer = options.warmer.map(|produce| {
            let cache = cache.clone();
            let clock = Arc::clone(&self.config.clock);
            Arc::new(move || {
                let produced = produce();
                let cache = cache.clone();
                let clock = Arc::clone(&clock);
                async move {
                    let value = produced.await?;
                    cache.set(format!("warm:{}", clock.now_ms()), value);
                    Ok::<(), anyhow::Error>(())
                }
                .boxed()
            }) as Warmer
        });

        Registration {
            cache: managed,
            typed: Box::new(cache),
            type_name: type_name::<TypedCache<V>>(),
            cleanup,
            warmer,
        }
    }

    /// Remove a cache from the registry.
    ///
    /// Cancels its scheduled cleanup and drops its warmer. The cache itself
    /// keeps its entries for anyone still holding it.
    /// Returns `true` if the cache was removed.
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.caches.write().remove(name);

        match removed {
            Some(mut registration) => {
                registration.detach();
                debug!("Removed cache: {}", name);
                true
            }
            None => false,
        }
    }

    /// Check if a cache with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.caches.read().contains_key(name)
    }

    /// Whether `name` has a running cleanup schedule.
    pub fn has_scheduled_cleanup(&self, name: &str) -> bool {
        self.caches
            .read()
            .get(name)
            .is_some_and(|entry| entry.cleanup.is_some())
    }

    /// Whether `name` has a warmer.
    pub fn has_warmer(&self, name: &str) -> bool {
        self.caches
            .read()
            .get(name)
            .is_some_and(|entry| entry.warmer.is_some())
    }

    /// Get the number of registered caches.
    pub fn len(&self) -> usize {
        self.caches.read().len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.caches.read().is_empty()
    }

    /// Get a sorted list of all registered cache names.
    pub fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Handles to every cache, taken so bulk work runs outside the lock.
    fn snapshot(&self) -> Vec<(String, Arc<dyn ManagedCache>)> {
        self.caches
            .read()
            .iter()
            .map(|(name, entry)| (name.clone(), Arc::clone(&entry.cache)))
            .collect()
    }

    /// Clear every registered cache.
    pub fn clear_all(&self) {
        for (_, cache) in self.snapshot() {
            cache.clear();
        }
        debug!("Cleared all caches");
    }

    /// Sweep expired entries from every cache now, returning how many were removed.
    pub fn cleanup_all(&self) -> usize {
        self.snapshot()
            .into_iter()
            .map(|(_, cache)| cache.cleanup())
            .sum()
    }

    /// Zero hit and miss counters of every cache.
    pub fn reset_all_stats(&self) {
        for (_, cache) in self.snapshot() {
            cache.reset_stats();
        }
    }

    /// Statistics of every cache plus totals.
    pub fn global_stats(&self) -> GlobalStats {
        let caches: BTreeMap<String, CacheStats> = self
            .snapshot()
            .into_iter()
            .map(|(name, cache)| (name, cache.stats()))
            .collect();

        GlobalStats::from_caches(caches)
    }

    /// Delete every live key matching `pattern` in every cache.
    ///
    /// Returns the number of keys deleted.
    pub fn invalidate_by_pattern(&self, pattern: &Regex) -> usize {
        let mut removed = 0;

        for (name, cache) in self.snapshot() {
            let matched = cache
                .keys()
                .into_iter()
                .filter(|key| pattern.is_match(key))
                .filter(|key| cache.remove(key))
                .count();

            if matched > 0 {
                debug!("Invalidated {} keys in '{}' matching {}", matched, name, pattern);
            }
            removed += matched;
        }

        removed
    }

    /// Diagnose hit rates and memory use against the configured thresholds.
    pub fn health_info(&self) -> HealthInfo {
        HealthInfo::evaluate(&self.global_stats(), &self.config.health)
    }

    /// Run warmers concurrently and store what they produce.
    ///
    /// `None` warms every cache that has a warmer. Names without a warmer are
    /// skipped. A failing warmer is logged and reported; it never affects the
    /// others.
    pub async fn warm_caches(&self, names: Option<&[&str]>) -> WarmReport {
        let selected: Vec<(String, Warmer)> = {
            let caches = self.caches.read();
            let wanted: Vec<String> = match names {
                Some(names) => names.iter().map(|name| name.to_string()).collect(),
                None => caches.keys().cloned().collect(),
            };

            wanted
                .into_iter()
                .filter_map(|name| {
                    let warmer = caches.get(&name).and_then(|entry| entry.warmer.clone());
                    if warmer.is_none() && names.is_some() {
                        debug!("No warmer registered for cache: {}", name);
                    }
                    warmer.map(|warmer| (name, warmer))
                })
                .collect()
        };

        let results = join_all(selected.into_iter().map(|(name, warm)| async move {
            let outcome = AssertUnwindSafe(async move { warm().await })
                .catch_unwind()
                .await;
            let result = match outcome {
                Ok(result) => result,
                Err(payload) => Err(anyhow!("warmer panicked: {}", panic_message(&*payload))),
            };
            (name, result)
        }))
        .await;

        let mut report = WarmReport::default();
        for (name, result) in results {
            match result {
                Ok(()) => {
                    debug!("Warmed cache: {}", name);
                    report.warmed.push(name);
                }
                Err(e) => {
                    warn!(cache = %name, error = %e, "Cache warmer failed");
                    report.failed.push(WarmFailure {
                        cache: name,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.warmed.sort_unstable();
        report.failed.sort_unstable_by(|a, b| a.cache.cmp(&b.cache));
        report
    }

    /// Cancel all schedules, drop warmers, clear and forget every cache.
    pub fn shutdown(&self) {
        let drained: Vec<Registration> =
            self.caches.write().drain().map(|(_, entry)| entry).collect();
        let count = drained.len();

        for mut registration in drained {
            registration.detach();
            registration.cache.clear();
        }

        info!("Cache registry shut down ({} caches released)", count);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("cache_count", &self.len())
            .field("cache_names", &self.cache_names())
            .finish()
    }
}
