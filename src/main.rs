//! Cachekeep - cache registry service.
//!
//! Builds the cache registry, serves the task repository through it and
//! periodically logs registry statistics and health until Ctrl-C.

use std::sync::Arc;

use tokio::time::{interval_at, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cachekeep::cache::CacheRegistry;
use cachekeep::config::Config;
use cachekeep::tasks::{InMemoryTaskBackend, NewTask, TaskRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cachekeep=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting cachekeep...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");
    info!(
        "Default TTL: {:?}, cleanup every {:?} (auto cleanup: {})",
        config.default_ttl, config.cleanup_interval, config.auto_cleanup
    );

    let registry = Arc::new(CacheRegistry::with_config(config.registry_config()));
    let tasks =
        TaskRepository::with_config(InMemoryTaskBackend::new(), &registry, config.cache_config())?;
    let seeded = tasks.create(NewTask::new("Review cache health")).await?;
    tasks.list().await?;
    tasks.get(seeded.id).await?;

    let mut ticker = interval_at(Instant::now() + config.report_interval, config.report_interval);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            _ = ticker.tick() => {
                let stats = registry.global_stats();
                let health = registry.health_info();
                info!("Cache stats: {}", serde_json::to_string(&stats)?);
                if health.healthy {
                    info!("Cache health: ok");
                } else {
                    warn!("Cache health: {}", serde_json::to_string(&health)?);
                }
            }
        }
    }

    registry.shutdown();
    Ok(())
}
