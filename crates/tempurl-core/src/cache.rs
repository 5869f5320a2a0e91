//! Sharded, TTL-aware in-memory cache.
//!
//! Keys are routed to one of [`SHARD_COUNT`] shards by the first byte of
//! their SHA-1 digest. Each shard carries its own `RwLock`, so readers of a
//! shard run concurrently while writers and the sweep are exclusive only
//! within that shard.
//!
//! An expired entry is never returned by a read, whether or not the sweeper
//! has physically removed it yet.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use sha1::{Digest, Sha1};

/// Number of independently locked shards.
pub const SHARD_COUNT: usize = 256;

/// Cache of signing secrets keyed by account id.
pub type SecretCache = ShardedCache<String>;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Option<Duration>, now: Instant) -> Self {
        // An unrepresentable deadline is treated as "never expires".
        let expires_at = ttl.and_then(|ttl| now.checked_add(ttl));
        Self { value, expires_at }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

#[derive(Debug)]
struct Shard<V> {
    items: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V> Default for Shard<V> {
    fn default() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }
}

/// A concurrent key/value cache partitioned into [`SHARD_COUNT`] shards.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tempurl_core::ShardedCache;
///
/// let cache = ShardedCache::new();
/// cache.set("acct-1", "secret".to_owned());
/// assert_eq!(cache.get("acct-1").as_deref(), Some("secret"));
///
/// cache.set_with_ttl("acct-2", "short".to_owned(), Duration::ZERO);
/// assert!(cache.get("acct-2").is_none());
/// ```
pub struct ShardedCache<V> {
    shards: Box<[Shard<V>]>,
}

impl<V: Clone> ShardedCache<V> {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        let shards = (0..SHARD_COUNT).map(|_| Shard::default()).collect();
        Self { shards }
    }

    /// Index of the shard owning `key`.
    #[must_use]
    pub fn shard_index(key: &str) -> usize {
        usize::from(Sha1::digest(key.as_bytes())[0])
    }

    fn shard(&self, key: &str) -> &Shard<V> {
        &self.shards[Self::shard_index(key)]
    }

    /// Return a clone of the live value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        let items = self.shard(key).items.read();
        let entry = items.get(key)?;
        if entry.is_expired(Instant::now()) {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Store `value` under `key` without expiry, replacing any previous value.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.insert(key.into(), value, None);
    }

    /// Store `value` under `key` for `ttl`, replacing any previous value.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.insert(key.into(), value, Some(ttl));
    }

    fn insert(&self, key: String, value: V, ttl: Option<Duration>) {
        let entry = CacheEntry::new(value, ttl, Instant::now());
        self.shard(&key).items.write().insert(key, entry);
    }

    /// Insert `value` only if `key` has no live entry.
    ///
    /// Returns `true` when the value was stored. The check and the insert
    /// happen under one shard write lock, so of several concurrent callers
    /// with the same key exactly one wins.
    pub fn insert_if_absent(&self, key: impl Into<String>, value: V, ttl: Duration) -> bool {
        let key = key.into();
        let now = Instant::now();
        let mut items = self.shard(&key).items.write();
        if let Some(existing) = items.get(&key) {
            if !existing.is_expired(now) {
                return false;
            }
        }
        items.insert(key, CacheEntry::new(value, Some(ttl), now));
        true
    }

    /// Remove `key`. Returns whether an entry was stored.
    pub fn delete(&self, key: &str) -> bool {
        self.shard(key).items.write().remove(key).is_some()
    }

    /// Physically remove every expired entry, one shard at a time.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        self.shards
            .iter()
            .map(|shard| {
                let mut items = shard.items.write();
                let before = items.len();
                items.retain(|_, entry| !entry.is_expired(now));
                before - items.len()
            })
            .sum()
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .items
                    .read()
                    .values()
                    .filter(|entry| !entry.is_expired(now))
                    .count()
            })
            .sum()
    }

    /// Whether the cache holds no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        for shard in &self.shards {
            shard.items.write().clear();
        }
    }
}

impl<V: Clone> Default for ShardedCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for ShardedCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stored: usize = self.shards.iter().map(|s| s.items.read().len()).sum();
        f.debug_struct("ShardedCache")
            .field("shards", &self.shards.len())
            .field("stored", &stored)
            .finish()
    }
}
