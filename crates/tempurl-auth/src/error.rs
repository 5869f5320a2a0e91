//! Error types for HMAC authentication.
//!
//! Every variant except [`AuthError::Upstream`] is a client failure and is
//! reported to the caller as one generic 401. The variant itself is only
//! logged.

/// Errors that can occur while authenticating a request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A required header is absent or empty.
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// The `Authorization` header does not have the form `<prefix> <key>:<sig>`.
    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    /// `X-Timestamp` is not a valid RFC 3339 timestamp.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// The timestamp lies outside the freshness window.
    #[error("Request timestamp is {skew_secs}s away from server time")]
    StaleRequest {
        /// Absolute distance from the server clock, in seconds.
        skew_secs: i64,
    },

    /// `Content-MD5` does not match the body.
    #[error("Content-MD5 does not match request body")]
    ContentMd5Mismatch,

    /// No secret is known for the API key.
    #[error("Unknown API key: {0}")]
    UnknownApiKey(String),

    /// The computed signature does not match the provided signature.
    #[error("Signature does not match")]
    SignatureDoesNotMatch,

    /// The `(apiKey, nonce)` pair was already used.
    #[error("Nonce already used: {0}")]
    ReplayedNonce(String),

    /// The secret could not be resolved because a collaborator failed.
    #[error("Secret resolution failed: {0}")]
    Upstream(String),
}

impl AuthError {
    /// Whether this failure is caused by the server side rather than the caller.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }
}
