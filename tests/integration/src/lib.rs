//! Integration tests for the tempurl broker.
//!
//! These tests require a running server seeded with `fixtures/seed.json`.
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! STORE_FILE=tests/integration/fixtures/seed.json cargo run -p tempurl-server &
//! cargo test -p tempurl-integration -- --ignored
//! ```

use std::sync::Once;

use tempurl_auth::{RequestSigner, SignedHeaders};

static INIT: Once = Once::new();

/// Account whose objects the seeded rules expose.
pub const ACME: Caller = Caller {
    api_key: "acme-key",
    secret: "acme-secret",
};

/// Account reserved for key removal tests.
pub const BETA: Caller = Caller {
    api_key: "beta-key",
    secret: "beta-secret",
};

/// Requestor the seeded rules grant access to.
pub const APP: Caller = Caller {
    api_key: "app1",
    secret: "app1-secret",
};

/// API credentials of a seeded account.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    /// API key (account id).
    pub api_key: &'static str,
    /// Shared secret.
    pub secret: &'static str,
}

impl Caller {
    /// A request signer for this caller.
    #[must_use]
    pub fn signer(&self) -> RequestSigner {
        RequestSigner::new("TempURL", self.api_key, self.secret)
    }
}

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
#[must_use]
pub fn endpoint_url() -> String {
    std::env::var("TEMPURL_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned())
}

/// Create an HTTP client.
#[must_use]
pub fn client() -> reqwest::Client {
    init_tracing();
    reqwest::Client::new()
}

/// Send a request carrying already computed signature headers.
pub async fn send_signed(
    client: &reqwest::Client,
    headers: &SignedHeaders,
    method: reqwest::Method,
    path: &str,
    body: Vec<u8>,
) -> reqwest::Response {
    let mut request = client.request(method, format!("{}{path}", endpoint_url()));
    for (name, value) in headers.pairs() {
        request = request.header(name, value);
    }
    let response = request.body(body).send().await.expect("request should complete");
    tracing::debug!(path, status = %response.status(), "broker responded");
    response
}

/// Sign and send a JSON request as `caller`.
pub async fn send(
    client: &reqwest::Client,
    caller: Caller,
    method: reqwest::Method,
    path: &str,
    body: &serde_json::Value,
) -> reqwest::Response {
    let body = if body.is_null() {
        Vec::new()
    } else {
        serde_json::to_vec(body).expect("JSON body")
    };
    let headers = caller
        .signer()
        .sign(method.as_str(), path, "application/json", &body);
    send_signed(client, &headers, method, path, body).await
}

/// Install `key` as the signing key of `account`, owned by `owner`.
pub async fn install_key(client: &reqwest::Client, owner: Caller, account: &str, key: &str) {
    let response = send(
        client,
        owner,
        reqwest::Method::PUT,
        &format!("/v1/keys/{account}"),
        &serde_json::json!({ "key": key }),
    )
    .await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
}

/// Extract `temp_url_expires` from a signed URL.
#[must_use]
pub fn expires_of(url: &str) -> i64 {
    url.rsplit_once("temp_url_expires=")
        .and_then(|(_, v)| v.parse().ok())
        .expect("URL should carry temp_url_expires")
}

mod test_auth;
mod test_keys;
mod test_urls;
