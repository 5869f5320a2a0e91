//! Store error types.

use std::time::Duration;

use tempurl_core::TempUrlError;

/// Errors raised by account and rule stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store did not answer within the configured bound.
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    /// A rule pattern failed validation or compilation.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An account with the same id or name already exists.
    #[error("duplicate account: {0}")]
    DuplicateAccount(String),

    /// A rule references an account that does not exist.
    #[error("unknown account: {0}")]
    UnknownAccount(String),

    /// The seed file could not be read.
    #[error("failed to read seed file {path}: {source}")]
    SeedIo {
        /// Path of the seed file.
        path: String,
        /// The I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The seed file is not valid JSON of the expected shape.
    #[error("invalid seed file: {0}")]
    SeedFormat(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether the failure is transient infrastructure trouble.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

impl From<StoreError> for TempUrlError {
    fn from(err: StoreError) -> Self {
        if let StoreError::UnknownAccount(name) = &err {
            return TempUrlError::unknown_account(name);
        }
        if err.is_transient() {
            TempUrlError::upstream(err.to_string()).with_source(err)
        } else {
            TempUrlError::internal_error(err.to_string()).with_source(err)
        }
    }
}
