//! Background sweep of expired cache entries.
//!
//! A single tokio task wakes on a fixed interval and purges every registered
//! cache. The task is owned by a [`CacheSweeper`] handle: [`CacheSweeper::stop`]
//! signals it and waits for it to finish, and dropping the handle aborts it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cache::ShardedCache;

/// Anything the sweeper can purge.
pub trait Sweep: Send + Sync {
    /// Remove expired entries, returning how many were removed.
    fn purge_expired(&self) -> usize;
}

impl<V: Clone + Send + Sync> Sweep for ShardedCache<V> {
    fn purge_expired(&self) -> usize {
        ShardedCache::purge_expired(self)
    }
}

/// Handle to the running sweep task.
#[derive(Debug)]
pub struct CacheSweeper {
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl CacheSweeper {
    /// Spawn the sweep task on the current tokio runtime.
    ///
    /// A zero `interval` (or no targets) yields an idle handle and spawns
    /// nothing.
    #[must_use]
    pub fn start(targets: Vec<Arc<dyn Sweep>>, interval: Duration) -> Self {
        if interval.is_zero() || targets.is_empty() {
            debug!("cache sweeper disabled");
            return Self {
                shutdown: None,
                handle: None,
            };
        }

        let (tx, mut rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let purged: usize = targets.iter().map(|t| t.purge_expired()).sum();
                        if purged > 0 {
                            debug!(purged, "swept expired cache entries");
                        }
                    }
                    _ = &mut rx => break,
                }
            }
        });

        info!(interval_secs = interval.as_secs_f64(), "cache sweeper started");
        Self {
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    /// Whether a sweep task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the sweep task and wait for it to exit.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "cache sweeper terminated abnormally");
            }
            info!("cache sweeper stopped");
        }
    }
}

impl Drop for CacheSweeper {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
