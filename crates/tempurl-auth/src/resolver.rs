//! API key to secret resolution.
//!
//! The authenticator never looks up secrets itself. It asks a
//! [`SecretResolver`], which can be backed by a fixed map
//! ([`StaticSecretResolver`]), by an account store, or by a read-through
//! cache in front of either ([`CachedSecretResolver`]).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempurl_core::ShardedCache;
use tracing::debug;

use crate::error::AuthError;

/// Resolves the shared secret belonging to an API key.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    /// Return the secret for `api_key`, or `None` when the key is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Upstream`] when the backing store cannot answer.
    async fn resolve(&self, api_key: &str) -> Result<Option<String>, AuthError>;
}

/// In-memory resolver backed by a `HashMap`.
///
/// # Examples
///
/// ```
/// use tempurl_auth::StaticSecretResolver;
///
/// let resolver = StaticSecretResolver::new(vec![("key-1".to_owned(), "s3cr3t".to_owned())]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticSecretResolver {
    secrets: HashMap<String, String>,
}

impl StaticSecretResolver {
    /// Create a resolver from `(api_key, secret)` pairs.
    pub fn new(secrets: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            secrets: secrets.into_iter().collect(),
        }
    }
}

#[async_trait]
impl SecretResolver for StaticSecretResolver {
    async fn resolve(&self, api_key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.secrets.get(api_key).cloned())
    }
}

/// Read-through cache in front of another resolver.
///
/// Hits are kept for `ttl`. Unknown keys and upstream failures are not
/// cached.
pub struct CachedSecretResolver {
    inner: Arc<dyn SecretResolver>,
    cache: Arc<ShardedCache<String>>,
    ttl: Duration,
}

impl CachedSecretResolver {
    /// Wrap `inner`, caching resolved secrets for `ttl`.
    pub fn new(inner: Arc<dyn SecretResolver>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Arc::new(ShardedCache::new()),
            ttl,
        }
    }

    /// The backing cache, for registration with a sweeper.
    #[must_use]
    pub fn cache(&self) -> Arc<ShardedCache<String>> {
        Arc::clone(&self.cache)
    }

    /// Drop a cached secret so the next lookup goes to the inner resolver.
    pub fn invalidate(&self, api_key: &str) {
        self.cache.delete(api_key);
    }
}

impl fmt::Debug for CachedSecretResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedSecretResolver")
            .field("cache", &self.cache)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SecretResolver for CachedSecretResolver {
    async fn resolve(&self, api_key: &str) -> Result<Option<String>, AuthError> {
        if let Some(secret) = self.cache.get(api_key) {
            debug!(api_key, "secret served from cache");
            return Ok(Some(secret));
        }

        let resolved = self.inner.resolve(api_key).await?;
        if let Some(secret) = &resolved {
            self.cache.set_with_ttl(api_key, secret.clone(), self.ttl);
        }
        Ok(resolved)
    }
}
