//! Broker configuration.
//!
//! Provides [`TempUrlConfig`] for configuring the tempurl broker. Values are
//! loaded from environment variables; anything unset or unparseable keeps its
//! default.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Broker configuration.
///
/// # Examples
///
/// ```
/// use tempurl_core::config::TempUrlConfig;
///
/// let config = TempUrlConfig::default();
/// assert_eq!(config.gateway_listen, "0.0.0.0:8080");
/// assert_eq!(config.default_duration, 300);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct TempUrlConfig {
    /// Bind address for the HTTP listener.
    #[builder(default = String::from("0.0.0.0:8080"))]
    pub gateway_listen: String,

    /// Blob-store URL prefix prepended to every signed path.
    #[builder(default = String::from("http://localhost:8081"))]
    pub object_host: String,

    /// Duration in seconds granted when a URL request omits one.
    #[builder(default = 300)]
    pub default_duration: i64,

    /// Scheme prefix expected in the `Authorization` header.
    #[builder(default = String::from("TempURL"))]
    pub auth_prefix: String,

    /// Maximum clock skew, in seconds, tolerated on `X-Timestamp`.
    #[builder(default = 300)]
    pub freshness_window_secs: u64,

    /// Interval between cache sweeps in seconds. Zero disables sweeping.
    #[builder(default = 60)]
    pub sweep_interval_secs: u64,

    /// Optional TTL in seconds applied to signing keys.
    #[builder(default)]
    pub signing_key_ttl_secs: Option<u64>,

    /// Upper bound on a single store call, in milliseconds.
    #[builder(default = 5_000)]
    pub store_timeout_ms: u64,

    /// JSON seed file of accounts and access rules.
    #[builder(default)]
    pub store_file: Option<String>,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for TempUrlConfig {
    fn default() -> Self {
        Self {
            gateway_listen: String::from("0.0.0.0:8080"),
            object_host: String::from("http://localhost:8081"),
            default_duration: 300,
            auth_prefix: String::from("TempURL"),
            freshness_window_secs: 300,
            sweep_interval_secs: 60,
            signing_key_ttl_secs: None,
            store_timeout_ms: 5_000,
            store_file: None,
            log_level: String::from("info"),
        }
    }
}

impl TempUrlConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:8080` |
    /// | `OBJECT_HOST` | `http://localhost:8081` |
    /// | `DEFAULT_DURATION` | `300` |
    /// | `AUTH_PREFIX` | `TempURL` |
    /// | `FRESHNESS_WINDOW` | `300` |
    /// | `SWEEP_INTERVAL` | `60` |
    /// | `SIGNING_KEY_TTL` | unset |
    /// | `STORE_TIMEOUT_MS` | `5000` |
    /// | `STORE_FILE` | unset |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("OBJECT_HOST") {
            config.object_host = v;
        }
        if let Some(v) = lookup("DEFAULT_DURATION") {
            if let Ok(n) = v.parse::<i64>() {
                if n > 0 {
                    config.default_duration = n;
                }
            }
        }
        if let Some(v) = lookup("AUTH_PREFIX") {
            if !v.is_empty() {
                config.auth_prefix = v;
            }
        }
        if let Some(v) = lookup("FRESHNESS_WINDOW") {
            if let Ok(n) = v.parse::<u64>() {
                config.freshness_window_secs = n;
            }
        }
        if let Some(v) = lookup("SWEEP_INTERVAL") {
            if let Ok(n) = v.parse::<u64>() {
                config.sweep_interval_secs = n;
            }
        }
        if let Some(v) = lookup("SIGNING_KEY_TTL") {
            config.signing_key_ttl_secs = v.parse::<u64>().ok().filter(|n| *n > 0);
        }
        if let Some(v) = lookup("STORE_TIMEOUT_MS") {
            if let Ok(n) = v.parse::<u64>() {
                config.store_timeout_ms = n;
            }
        }
        if let Some(v) = lookup("STORE_FILE") {
            config.store_file = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// Freshness window as a [`Duration`].
    #[must_use]
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_window_secs)
    }

    /// Sweep interval as a [`Duration`]; zero means disabled.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Signing-key TTL, if one is configured.
    #[must_use]
    pub fn signing_key_ttl(&self) -> Option<Duration> {
        self.signing_key_ttl_secs.map(Duration::from_secs)
    }

    /// Store call timeout as a [`Duration`].
    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}
