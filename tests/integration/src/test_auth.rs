//! Authentication integration tests.

#[cfg(test)]
mod tests {
    use futures::future::join_all;
    use reqwest::{Method, StatusCode};

    use crate::{APP, client, endpoint_url, send, send_signed};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_health_without_signature() {
        let resp = client()
            .get(format!("{}/health", endpoint_url()))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("x-request-id"));
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "running");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_unsigned_request() {
        let resp = client()
            .post(format!("{}/v1/urls", endpoint_url()))
            .body("{}")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body, serde_json::json!({"error": "Unauthorized"}));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_replayed_request() {
        let client = client();
        let body = br#"{"account":"acme","container":"nope","object":"x","method":"GET"}"#;
        let headers = APP
            .signer()
            .sign("POST", "/v1/urls", "application/json", body);

        let first = send_signed(&client, &headers, Method::POST, "/v1/urls", body.to_vec()).await;
        assert_ne!(first.status(), StatusCode::UNAUTHORIZED);

        let replay = send_signed(&client, &headers, Method::POST, "/v1/urls", body.to_vec()).await;
        assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_accept_concurrent_replays_at_most_once() {
        let client = client();
        let body = br#"{"account":"acme","container":"nope","object":"x","method":"GET"}"#;
        let headers = APP
            .signer()
            .sign("POST", "/v1/urls", "application/json", body);

        let responses = join_all((0..8).map(|_| {
            send_signed(&client, &headers, Method::POST, "/v1/urls", body.to_vec())
        }))
        .await;
        let accepted = responses
            .iter()
            .filter(|r| r.status() != StatusCode::UNAUTHORIZED)
            .count();
        assert_eq!(accepted, 1);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_tampered_body() {
        let client = client();
        let signed = br#"{"account":"acme","container":"logs","object":"a","method":"GET"}"#;
        let sent = br#"{"account":"acme","container":"logs","object":"b","method":"GET"}"#;
        let headers = APP
            .signer()
            .sign("POST", "/v1/urls", "application/json", signed);

        let resp = send_signed(&client, &headers, Method::POST, "/v1/urls", sent.to_vec()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_route_only_after_authentication() {
        let client = client();
        let resp = client
            .get(format!("{}/v1/unknown", endpoint_url()))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = send(&client, APP, Method::GET, "/v1/unknown", &serde_json::Value::Null).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(&client, APP, Method::GET, "/v1/urls", &serde_json::Value::Null).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
