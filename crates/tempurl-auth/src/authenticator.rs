//! Server-side HMAC request verification.
//!
//! [`HmacAuthenticator::authenticate`] checks, in order: the `Authorization`
//! format, presence of the remaining signed headers, timestamp freshness,
//! body integrity, the API key, the signature, and finally nonce reuse. The
//! nonce is only recorded once everything else has passed, so a forged
//! request cannot burn a legitimate caller's nonce.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::AuthError;
use crate::nonce::NonceGuard;
use crate::resolver::SecretResolver;
use crate::signing::{
    CONTENT_MD5, SigningFields, X_NONCE, X_TIMESTAMP, compute_signature, content_md5,
    string_to_sign,
};

/// The outcome of successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResult {
    /// The API key that signed the request.
    pub api_key: String,
    /// The nonce consumed by the request.
    pub nonce: String,
}

/// Verifies HMAC-signed requests against secrets from a [`SecretResolver`].
pub struct HmacAuthenticator {
    prefix: String,
    window: Duration,
    resolver: Arc<dyn SecretResolver>,
    nonces: NonceGuard,
}

impl std::fmt::Debug for HmacAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacAuthenticator")
            .field("prefix", &self.prefix)
            .field("window", &self.window)
            .field("nonces", &self.nonces)
            .finish_non_exhaustive()
    }
}

impl HmacAuthenticator {
    /// Create an authenticator.
    ///
    /// `prefix` is the `Authorization` scheme (e.g. `"TempURL"`) and `window`
    /// the maximum tolerated distance between `X-Timestamp` and server time.
    pub fn new(
        prefix: impl Into<String>,
        window: Duration,
        resolver: Arc<dyn SecretResolver>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            window,
            resolver,
            nonces: NonceGuard::new(window),
        }
    }

    /// The replay guard, for registering its cache with a sweeper.
    #[must_use]
    pub fn nonce_guard(&self) -> &NonceGuard {
        &self.nonces
    }

    /// Authenticate a request against the current time.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] describing the first check that failed.
    pub async fn authenticate(
        &self,
        parts: &http::request::Parts,
        body: &[u8],
    ) -> Result<AuthResult, AuthError> {
        self.authenticate_at(parts, body, Utc::now()).await
    }

    /// Authenticate a request as if the server clock read `now`.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] describing the first check that failed.
    pub async fn authenticate_at(
        &self,
        parts: &http::request::Parts,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<AuthResult, AuthError> {
        let auth_header = required_header(parts, http::header::AUTHORIZATION.as_str())?;
        let (api_key, provided_signature) = parse_auth_header(auth_header, &self.prefix)?;

        let timestamp = required_header(parts, X_TIMESTAMP)?;
        let provided_md5 = required_header(parts, CONTENT_MD5)?;
        let content_type = required_header(parts, http::header::CONTENT_TYPE.as_str())?;
        let nonce = required_header(parts, X_NONCE)?;

        debug!(api_key, nonce, "verifying HMAC request");

        self.check_freshness(timestamp, now)?;

        if !content_md5(body).eq_ignore_ascii_case(provided_md5) {
            return Err(AuthError::ContentMd5Mismatch);
        }

        let secret = self
            .resolver
            .resolve(api_key)
            .await?
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::UnknownApiKey(api_key.to_owned()))?;

        let uri = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path(), http::uri::PathAndQuery::as_str);

        let to_sign = string_to_sign(&SigningFields {
            method: parts.method.as_str(),
            uri,
            content_md5: provided_md5,
            content_type,
            timestamp,
            nonce,
            api_key,
        });
        let expected_signature = compute_signature(&secret, &to_sign);

        if !bool::from(
            provided_signature
                .as_bytes()
                .ct_eq(expected_signature.as_bytes()),
        ) {
            debug!(api_key, string_to_sign = ?to_sign, "signature mismatch");
            return Err(AuthError::SignatureDoesNotMatch);
        }

        if !self.nonces.check_and_record(api_key, nonce) {
            return Err(AuthError::ReplayedNonce(nonce.to_owned()));
        }

        debug!(api_key, "HMAC verification succeeded");
        Ok(AuthResult {
            api_key: api_key.to_owned(),
            nonce: nonce.to_owned(),
        })
    }

    fn check_freshness(&self, timestamp: &str, now: DateTime<Utc>) -> Result<(), AuthError> {
        let sent = DateTime::parse_from_rfc3339(timestamp)
            .map_err(|_| AuthError::InvalidTimestamp(timestamp.to_owned()))?
            .with_timezone(&Utc);
        let window = TimeDelta::from_std(self.window).unwrap_or(TimeDelta::MAX);
        let skew = (now - sent).abs();
        if skew > window {
            return Err(AuthError::StaleRequest {
                skew_secs: skew.num_seconds(),
            });
        }
        Ok(())
    }
}

/// Split `<prefix> <apiKey>:<signature>`.
fn parse_auth_header<'a>(header: &'a str, prefix: &str) -> Result<(&'a str, &'a str), AuthError> {
    let rest = header
        .strip_prefix(prefix)
        .and_then(|r| r.strip_prefix(' '))
        .ok_or(AuthError::InvalidAuthHeader)?;

    let (api_key, signature) = rest.split_once(':').ok_or(AuthError::InvalidAuthHeader)?;

    if api_key.is_empty() || signature.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok((api_key, signature))
}

/// Fetch a header that must be present, valid UTF-8 and non-empty.
fn required_header<'a>(parts: &'a http::request::Parts, name: &str) -> Result<&'a str, AuthError> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AuthError::MissingHeader(name.to_owned()))
}
