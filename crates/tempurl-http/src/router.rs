//! Request router.
//!
//! ```text
//! POST   /v1/urls          -> CreateUrl
//! PUT    /v1/keys/{name}   -> SetKey
//! DELETE /v1/keys/{name}   -> RemoveKey
//! GET    /health, /_health -> liveness probe (unauthenticated)
//! ```

use std::fmt;

use tempurl_core::TempUrlError;

const URLS_PATH: &str = "/v1/urls";
const KEYS_PREFIX: &str = "/v1/keys/";
const HEALTH_PATHS: &[&str] = &["/health", "/_health"];

/// An authenticated broker operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TempUrlRoute {
    /// Issue a temporary URL.
    CreateUrl,
    /// Install the signing key of the named account.
    SetKey {
        /// Account name from the path.
        name: String,
    },
    /// Remove the signing key of the named account.
    RemoveKey {
        /// Account name from the path.
        name: String,
    },
}

impl TempUrlRoute {
    /// Operation name for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateUrl => "CreateUrl",
            Self::SetKey { .. } => "SetKey",
            Self::RemoveKey { .. } => "RemoveKey",
        }
    }
}

impl fmt::Display for TempUrlRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the request targets the liveness probe.
#[must_use]
pub fn is_health_check(method: &http::Method, path: &str) -> bool {
    (method == http::Method::GET || method == http::Method::HEAD) && HEALTH_PATHS.contains(&path)
}

/// Resolve the operation for `method` and `path`.
///
/// # Errors
///
/// Returns `NotFound` for an unknown path and `MethodNotAllowed` for a known
/// path with the wrong method.
pub fn resolve_route(method: &http::Method, path: &str) -> Result<TempUrlRoute, TempUrlError> {
    if path == URLS_PATH {
        return if method == http::Method::POST {
            Ok(TempUrlRoute::CreateUrl)
        } else {
            Err(TempUrlError::method_not_allowed(method, path))
        };
    }

    if let Some(name) = path.strip_prefix(KEYS_PREFIX) {
        if name.is_empty() || name.contains('/') {
            return Err(TempUrlError::not_found(path));
        }
        let name = name.to_owned();
        return if method == http::Method::PUT {
            Ok(TempUrlRoute::SetKey { name })
        } else if method == http::Method::DELETE {
            Ok(TempUrlRoute::RemoveKey { name })
        } else {
            Err(TempUrlError::method_not_allowed(method, path))
        };
    }

    Err(TempUrlError::not_found(path))
}
