//! String-to-sign construction and client-side request signing.
//!
//! The verifier and [`RequestSigner`] share [`string_to_sign`] and
//! [`compute_signature`], so both sides always agree on field order.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, KeyInit, Mac};
use md5::{Digest, Md5};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the RFC 3339 request timestamp.
pub const X_TIMESTAMP: &str = "x-timestamp";
/// Header carrying the single-use nonce.
pub const X_NONCE: &str = "x-nonce";
/// Header carrying the hex MD5 of the body.
pub const CONTENT_MD5: &str = "content-md5";

/// The signed fields of a request, in signing order.
#[derive(Debug, Clone, Copy)]
pub struct SigningFields<'a> {
    /// HTTP method, as sent.
    pub method: &'a str,
    /// Request path plus `?query` when present.
    pub uri: &'a str,
    /// Value of `Content-MD5`.
    pub content_md5: &'a str,
    /// Value of `Content-Type`.
    pub content_type: &'a str,
    /// Value of `X-Timestamp`.
    pub timestamp: &'a str,
    /// Value of `X-Nonce`.
    pub nonce: &'a str,
    /// The API key from `Authorization`.
    pub api_key: &'a str,
}

/// Build the string to sign. Every field is followed by `\n`, including the last.
#[must_use]
pub fn string_to_sign(fields: &SigningFields<'_>) -> String {
    let SigningFields {
        method,
        uri,
        content_md5,
        content_type,
        timestamp,
        nonce,
        api_key,
    } = fields;
    format!("{method}\n{uri}\n{content_md5}\n{content_type}\n{timestamp}\n{nonce}\n{api_key}\n")
}

/// Compute `Base64(HMAC-SHA256(secret, string_to_sign))`.
#[must_use]
pub fn compute_signature(secret: &str, string_to_sign: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can accept any key length");
    mac.update(string_to_sign.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Lowercase hex MD5 of `body`.
#[must_use]
pub fn content_md5(body: &[u8]) -> String {
    hex::encode(Md5::digest(body))
}

/// Headers produced by [`RequestSigner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// `Authorization` value.
    pub authorization: String,
    /// `X-Timestamp` value.
    pub timestamp: String,
    /// `X-Nonce` value.
    pub nonce: String,
    /// `Content-MD5` value.
    pub content_md5: String,
    /// `Content-Type` value.
    pub content_type: String,
}

impl SignedHeaders {
    /// Header name/value pairs, ready to attach to any HTTP client request.
    #[must_use]
    pub fn pairs(&self) -> [(&'static str, &str); 5] {
        [
            ("authorization", &self.authorization),
            (X_TIMESTAMP, &self.timestamp),
            (X_NONCE, &self.nonce),
            (CONTENT_MD5, &self.content_md5),
            ("content-type", &self.content_type),
        ]
    }

    /// Attach the headers to an `http` request builder.
    #[must_use]
    pub fn apply(&self, mut builder: http::request::Builder) -> http::request::Builder {
        for (name, value) in self.pairs() {
            builder = builder.header(name, value);
        }
        builder
    }
}

/// Client-side signer for broker API calls.
///
/// # Examples
///
/// ```
/// use tempurl_auth::RequestSigner;
///
/// let signer = RequestSigner::new("TempURL", "key-1", "s3cr3t");
/// let headers = signer.sign("POST", "/v1/urls", "application/json", b"{}");
/// assert!(headers.authorization.starts_with("TempURL key-1:"));
/// ```
#[derive(Clone)]
pub struct RequestSigner {
    prefix: String,
    api_key: String,
    secret: String,
}

impl RequestSigner {
    /// Create a signer for `api_key` using `prefix` as the Authorization scheme.
    pub fn new(
        prefix: impl Into<String>,
        api_key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            api_key: api_key.into(),
            secret: secret.into(),
        }
    }

    /// Sign a request with the current time and a fresh UUID nonce.
    #[must_use]
    pub fn sign(&self, method: &str, uri: &str, content_type: &str, body: &[u8]) -> SignedHeaders {
        let nonce = uuid::Uuid::new_v4().to_string();
        self.sign_at(method, uri, content_type, body, Utc::now(), &nonce)
    }

    /// Sign a request with an explicit timestamp and nonce.
    #[must_use]
    pub fn sign_at(
        &self,
        method: &str,
        uri: &str,
        content_type: &str,
        body: &[u8],
        at: DateTime<Utc>,
        nonce: &str,
    ) -> SignedHeaders {
        let timestamp = at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let md5 = content_md5(body);
        let to_sign = string_to_sign(&SigningFields {
            method,
            uri,
            content_md5: &md5,
            content_type,
            timestamp: &timestamp,
            nonce,
            api_key: &self.api_key,
        });
        let signature = compute_signature(&self.secret, &to_sign);

        SignedHeaders {
            authorization: format!("{} {}:{signature}", self.prefix, self.api_key),
            timestamp,
            nonce: nonce.to_owned(),
            content_md5: md5,
            content_type: content_type.to_owned(),
        }
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("prefix", &self.prefix)
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}
