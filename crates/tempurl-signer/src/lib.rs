//! Access-rule evaluation and temporary URL signing.
//!
//! A temporary URL is
//!
//! ```text
//! {host}/v1/{account}/{container}/{object}?temp_url_sig={sig}&temp_url_expires={expires}
//! ```
//!
//! where `sig = hex(HMAC-SHA1(signing_key, METHOD + "\n" + expires + "\n" + path))`
//! and the signing key belongs to the account that granted access.
//!
//! [`TempUrlProvider`] ties rule lookup, key resolution and signing together;
//! [`TempUrlBrokerHandler`] exposes it to the HTTP layer.

pub mod handler;
pub mod provider;
pub mod rules;
pub mod signature;

pub use handler::TempUrlBrokerHandler;
pub use provider::TempUrlProvider;
pub use rules::{evaluate_rules, grant_duration};
pub use signature::{object_path, sign_temp_url, sign_temp_url_at, temp_url_signature};
