//! HMAC request authentication for the tempurl broker.
//!
//! Every API call carries five headers:
//!
//! ```text
//! Authorization: <prefix> <apiKey>:<base64 signature>
//! X-Timestamp:   RFC 3339 timestamp
//! Content-MD5:   lowercase hex MD5 of the body
//! Content-Type:  media type of the body
//! X-Nonce:       single-use random value
//! ```
//!
//! The signature is `Base64(HMAC-SHA256(secret, StringToSign))` with
//!
//! ```text
//! StringToSign = Method + "\n" + URI + "\n" + Content-MD5 + "\n" +
//!                Content-Type + "\n" + X-Timestamp + "\n" + X-Nonce + "\n" +
//!                ApiKey + "\n"
//! ```
//!
//! # Modules
//!
//! - [`authenticator`] - Server-side verification ([`HmacAuthenticator`])
//! - [`error`] - Authentication error types
//! - [`nonce`] - Replay protection ([`NonceGuard`])
//! - [`resolver`] - API key to secret resolution ([`SecretResolver`])
//! - [`signing`] - String-to-sign construction and the client-side [`RequestSigner`]

pub mod authenticator;
pub mod error;
pub mod nonce;
pub mod resolver;
pub mod signing;

pub use authenticator::{AuthResult, HmacAuthenticator};
pub use error::AuthError;
pub use nonce::NonceGuard;
pub use resolver::{CachedSecretResolver, SecretResolver, StaticSecretResolver};
pub use signing::{RequestSigner, SignedHeaders};
