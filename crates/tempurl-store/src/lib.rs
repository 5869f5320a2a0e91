//! Account lookup and access-rule storage for the tempurl broker.
//!
//! The broker talks to its data through two narrow traits,
//! [`AccountLookup`] and [`AccessRuleStore`]. [`MemoryStore`] implements both
//! in memory and can be seeded from a JSON file; [`StoreSecretResolver`]
//! adapts an [`AccountLookup`] into the authenticator's secret resolver.

pub mod error;
pub mod memory;
pub mod resolver;
pub mod rule;
pub mod seed;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tempurl_core::{Account, RuleGrant};

pub use error::StoreError;
pub use memory::MemoryStore;
pub use resolver::StoreSecretResolver;
pub use rule::{AccessRule, CompiledRule, MAX_PATTERN_LEN};
pub use seed::SeedFile;

/// Looks up accounts by name or id.
#[async_trait]
pub trait AccountLookup: Send + Sync {
    /// Find the account with the given unique name.
    async fn account_by_name(&self, name: &str) -> Result<Option<Account>, StoreError>;

    /// Find the account with the given id (its owner's API key).
    async fn account_by_id(&self, id: &str) -> Result<Option<Account>, StoreError>;
}

/// The parameters of a rule match.
#[derive(Debug, Clone, Copy)]
pub struct RuleQuery<'a> {
    /// API key of the authenticated caller.
    pub requestor_api_key: &'a str,
    /// Name of the account owning the object.
    pub account: &'a str,
    /// Container name.
    pub container: &'a str,
    /// Object name.
    pub object: &'a str,
    /// HTTP method, compared case-insensitively.
    pub method: &'a str,
}

/// Finds access rules authorizing a request.
#[async_trait]
pub trait AccessRuleStore: Send + Sync {
    /// Return every rule matching `query`. More than one match is the
    /// caller's problem to report, never to resolve.
    async fn matching_rules(&self, query: &RuleQuery<'_>) -> Result<Vec<RuleGrant>, StoreError>;
}

/// Run a store call with an upper bound on its duration.
///
/// # Errors
///
/// Returns [`StoreError::Timeout`] when `limit` elapses, or the call's own error.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| StoreError::Timeout(limit))?
}
