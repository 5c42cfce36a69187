//! Scheduled background sweeps.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::registry::ManagedCache;

/// Periodic `cleanup()` of one cache.
///
/// The task is aborted when this handle is cancelled or dropped, so a sweep
/// never runs against a cache the registry has let go of.
#[derive(Debug)]
pub struct CleanupTask {
    handle: JoinHandle<()>,
}

impl CleanupTask {
    /// Start sweeping `cache` every `interval`, first sweep one interval from now.
    ///
    /// Returns `None` if there is no tokio runtime or the interval is zero.
    pub fn spawn(cache: Arc<dyn ManagedCache>, interval: Duration) -> Option<Self> {
        if interval.is_zero() {
            warn!(cache = cache.name(), "Cleanup interval is zero, not scheduling");
            return None;
        }

        let Ok(runtime) = Handle::try_current() else {
            warn!(cache = cache.name(), "No tokio runtime, cleanup not scheduled");
            return None;
        };

        let handle = runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let removed = cache.cleanup();
                debug!("Scheduled cleanup of '{}' removed {} entries", cache.name(), removed);
            }
        });

        Some(Self { handle })
    }

    /// Stop the sweep.
    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for CleanupTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
