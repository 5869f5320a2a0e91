//! Domain types shared across the broker.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TempUrlError, TempUrlResult};

/// An account that can grant access and authenticate requests.
///
/// The `secret` verifies inbound HMAC signatures. It is never serialized
/// back to callers; use [`Account::view`] for responses.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    /// Account identifier; doubles as the API key of its owner.
    pub id: String,
    /// Unique account name used in object paths.
    pub name: String,
    /// Shared secret for request authentication.
    pub secret: String,
}

impl Account {
    /// Create a new account.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            secret: secret.into(),
        }
    }

    /// Public projection of this account.
    #[must_use]
    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Account as returned to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    /// Account identifier.
    pub id: String,
    /// Account name.
    pub name: String,
}

/// Request for a temporary URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlRequest {
    /// Name of the account owning the object.
    pub account: String,
    /// Container holding the object.
    pub container: String,
    /// Object name.
    pub object: String,
    /// HTTP method the URL will be valid for.
    pub method: String,
    /// Requested lifetime in seconds; the configured default applies when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

impl UrlRequest {
    /// Check required fields and the duration sign.
    ///
    /// A missing duration is accepted here; the caller substitutes its
    /// default before signing.
    pub fn validate(&self) -> TempUrlResult<()> {
        let required = [
            ("account", &self.account),
            ("container", &self.container),
            ("object", &self.object),
            ("method", &self.method),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(TempUrlError::invalid_request(format!(
                    "missing required field: {field}"
                )));
            }
        }
        if let Some(duration) = self.duration {
            if duration <= 0 {
                return Err(TempUrlError::invalid_request(
                    "duration must be a positive number of seconds",
                ));
            }
        }
        Ok(())
    }
}

/// A signed temporary URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TempUrl {
    /// Full URL including signature and expiry query parameters.
    pub url: String,
    /// Object path that was signed.
    pub path: String,
    /// Unix timestamp after which the URL stops working.
    #[serde(skip)]
    pub expires: i64,
}

/// Body of a signing-key upload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeyRequest {
    /// The new signing key.
    pub key: String,
}

/// One access rule matched by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleGrant {
    /// Id of the account whose signing key signs the URL.
    pub granting_account_id: String,
    /// Upper bound on the granted duration, in seconds.
    pub max_duration: Option<i64>,
}
