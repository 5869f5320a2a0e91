//! Temporary URL signature derivation.

use chrono::Utc;
use hmac::{Hmac, KeyInit, Mac};
use sha1::Sha1;
use tempurl_core::{TempUrl, UrlRequest};

type HmacSha1 = Hmac<Sha1>;

/// Object path signed into a temporary URL.
#[must_use]
pub fn object_path(account: &str, container: &str, object: &str) -> String {
    format!("/v1/{account}/{container}/{object}")
}

/// Compute `hex(HMAC-SHA1(secret, METHOD\nEXPIRES\nPATH))`. The method is
/// uppercased before signing.
#[must_use]
pub fn temp_url_signature(secret: &str, method: &str, expires: i64, path: &str) -> String {
    let method = method.to_ascii_uppercase();
    let mut mac =
        HmacSha1::new_from_slice(secret.as_bytes()).expect("HMAC can accept any key length");
    mac.update(format!("{method}\n{expires}\n{path}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Sign a URL for `request`, valid for `granted_secs` from now.
#[must_use]
pub fn sign_temp_url(host: &str, secret: &str, request: &UrlRequest, granted_secs: i64) -> TempUrl {
    sign_temp_url_at(host, secret, request, granted_secs, Utc::now().timestamp())
}

/// Sign a URL for `request`, valid for `granted_secs` from `now_unix`.
#[must_use]
pub fn sign_temp_url_at(
    host: &str,
    secret: &str,
    request: &UrlRequest,
    granted_secs: i64,
    now_unix: i64,
) -> TempUrl {
    let path = object_path(&request.account, &request.container, &request.object);
    let expires = now_unix.saturating_add(granted_secs);
    let sig = temp_url_signature(secret, &request.method, expires, &path);
    let url = format!("{host}{path}?temp_url_sig={sig}&temp_url_expires={expires}");
    TempUrl { url, path, expires }
}
