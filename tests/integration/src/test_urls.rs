//! Temporary URL issuance integration tests.

#[cfg(test)]
mod tests {
    use reqwest::{Method, StatusCode};
    use serde_json::json;

    use crate::{ACME, APP, client, expires_of, install_key, send};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_issue_capped_url() {
        let client = client();
        install_key(&client, ACME, "acme", "S").await;

        let before = chrono::Utc::now().timestamp();
        let resp = send(
            &client,
            APP,
            Method::POST,
            "/v1/urls",
            &json!({
                "account": "acme",
                "container": "logs",
                "object": "2024/app.log",
                "method": "GET",
                "duration": 3600
            }),
        )
        .await;
        let after = chrono::Utc::now().timestamp();

        assert_eq!(resp.status(), StatusCode::CREATED);
        let location = resp.headers()["location"].to_str().unwrap().to_owned();
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["url"], location);
        assert_eq!(body["path"], "/v1/acme/logs/2024/app.log");

        let expires = expires_of(&location);
        assert!(expires >= before + 600 && expires <= after + 600);
        assert!(location.contains("/v1/acme/logs/2024/app.log?temp_url_sig="));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_match_object_pattern_and_method() {
        let client = client();
        install_key(&client, ACME, "acme", "S").await;

        let request = |object: &str, method: &str| {
            json!({
                "account": "acme",
                "container": "uploads",
                "object": object,
                "method": method,
                "duration": 60
            })
        };

        let resp = send(&client, APP, Method::POST, "/v1/urls", &request("incoming/a.bin", "PUT")).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = send(&client, APP, Method::POST, "/v1/urls", &request("outgoing/a.bin", "PUT")).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = send(&client, APP, Method::POST, "/v1/urls", &request("incoming/a.bin", "GET")).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_bad_url_requests() {
        let client = client();

        let resp = send(
            &client,
            APP,
            Method::POST,
            "/v1/urls",
            &json!({"account": "acme", "container": "logs"}),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("object"));

        let resp = send(
            &client,
            APP,
            Method::POST,
            "/v1/urls",
            &json!({
                "account": "acme",
                "container": "logs",
                "object": "a",
                "method": "GET",
                "duration": -5
            }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
