//! Secret resolution backed by an account store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempurl_auth::{AuthError, SecretResolver};
use tracing::warn;

use crate::{AccountLookup, with_timeout};

/// Resolves an API key to the secret of the account with that id.
pub struct StoreSecretResolver {
    accounts: Arc<dyn AccountLookup>,
    timeout: Duration,
}

impl StoreSecretResolver {
    /// Resolve through `accounts`, giving each lookup at most `timeout`.
    pub fn new(accounts: Arc<dyn AccountLookup>, timeout: Duration) -> Self {
        Self { accounts, timeout }
    }
}

impl std::fmt::Debug for StoreSecretResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSecretResolver")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SecretResolver for StoreSecretResolver {
    async fn resolve(&self, api_key: &str) -> Result<Option<String>, AuthError> {
        let account = with_timeout(self.timeout, self.accounts.account_by_id(api_key))
            .await
            .map_err(|e| {
                warn!(api_key, error = %e, "secret lookup failed");
                AuthError::Upstream(e.to_string())
            })?;
        Ok(account.map(|a| a.secret))
    }
}
