//! Replay protection.

use std::sync::Arc;
use std::time::Duration;

use tempurl_core::{ShardedCache, Sweep};

/// Remembers `(apiKey, nonce)` pairs for a fixed TTL.
///
/// A timestamp is accepted anywhere in `[now - window, now + window]`, so a
/// pair must be remembered for twice the freshness window to cover every
/// instant at which the same signed request could still pass the staleness
/// check.
#[derive(Debug)]
pub struct NonceGuard {
    seen: Arc<ShardedCache<()>>,
    ttl: Duration,
}

impl NonceGuard {
    /// Create a guard for the given freshness window.
    #[must_use]
    pub fn new(freshness_window: Duration) -> Self {
        Self {
            seen: Arc::new(ShardedCache::new()),
            ttl: freshness_window.saturating_mul(2),
        }
    }

    /// How long a recorded pair is remembered.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Record the pair. Returns `false` if it was already recorded.
    pub fn check_and_record(&self, api_key: &str, nonce: &str) -> bool {
        // Header values cannot contain '\n', so the joined key is unambiguous.
        self.seen.insert_if_absent(format!("{api_key}\n{nonce}"), (), self.ttl)
    }

    /// The backing cache, for registration with a sweeper.
    #[must_use]
    pub fn sweep_target(&self) -> Arc<dyn Sweep> {
        self.seen.clone()
    }
}
