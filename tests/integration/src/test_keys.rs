//! Signing-key management integration tests.

#[cfg(test)]
mod tests {
    use reqwest::{Method, StatusCode};
    use serde_json::json;

    use crate::{ACME, APP, BETA, client, send};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_account_view_on_key_upload() {
        let resp = send(
            &client(),
            ACME,
            Method::PUT,
            "/v1/keys/acme",
            &json!({"key": "S"}),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"id": "acme-key", "name": "acme"}));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_key_upload_by_non_owner() {
        let resp = send(
            &client(),
            APP,
            Method::PUT,
            "/v1/keys/acme",
            &json!({"key": "stolen"}),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_unknown_account_and_empty_key() {
        let client = client();
        let resp = send(
            &client,
            ACME,
            Method::PUT,
            "/v1/keys/nobody",
            &json!({"key": "k"}),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::GONE);

        let resp = send(&client, ACME, Method::PUT, "/v1/keys/acme", &json!({})).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_remove_key() {
        let client = client();
        crate::install_key(&client, BETA, "beta", "beta-signing").await;

        let resp = send(
            &client,
            BETA,
            Method::DELETE,
            "/v1/keys/beta",
            &serde_json::Value::Null,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = send(
            &client,
            APP,
            Method::DELETE,
            "/v1/keys/beta",
            &serde_json::Value::Null,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
