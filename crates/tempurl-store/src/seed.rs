//! JSON seed files.
//!
//! ```json
//! {
//!   "accounts": [{"id": "acme-key", "name": "acme", "secret": "..."}],
//!   "rules": [{
//!     "grantingAccount": "acme-key",
//!     "requestorApiKey": "app1",
//!     "containerPattern": "logs",
//!     "objectPattern": ".*",
//!     "method": "GET",
//!     "maxDuration": 600
//!   }]
//! }
//! ```

use std::path::Path;

use serde::Deserialize;
use tempurl_core::Account;

use crate::error::StoreError;
use crate::rule::AccessRule;

/// Accounts and rules to preload into a store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedFile {
    /// Accounts to create.
    pub accounts: Vec<Account>,
    /// Rules to add once all accounts exist.
    pub rules: Vec<AccessRule>,
}

impl SeedFile {
    /// Parse a seed document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SeedFormat`] on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a seed file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SeedIo`] if the file cannot be read, or
    /// [`StoreError::SeedFormat`] if it cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| StoreError::SeedIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}
