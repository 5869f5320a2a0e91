//! Handler bridging the HTTP layer to [`TempUrlProvider`].

use std::sync::Arc;

use bytes::Bytes;
use tempurl_core::{TempUrlError, UrlRequest};
use tempurl_http::body::TempUrlResponseBody;
use tempurl_http::dispatch::{HandlerFuture, TempUrlHandler};
use tempurl_http::response::{created_response, json_response, no_content_response};
use tempurl_http::router::TempUrlRoute;

use crate::provider::TempUrlProvider;

/// Handler that bridges the HTTP layer to the broker provider.
#[derive(Debug)]
pub struct TempUrlBrokerHandler {
    provider: Arc<TempUrlProvider>,
}

impl TempUrlBrokerHandler {
    /// Create a new handler wrapping a provider.
    #[must_use]
    pub fn new(provider: Arc<TempUrlProvider>) -> Self {
        Self { provider }
    }
}

impl TempUrlHandler for TempUrlBrokerHandler {
    fn handle_route(
        &self,
        route: TempUrlRoute,
        requestor: String,
        body: Bytes,
        request_id: String,
    ) -> HandlerFuture {
        let provider = Arc::clone(&self.provider);
        Box::pin(async move {
            dispatch(provider.as_ref(), route, &requestor, &body, &request_id).await
        })
    }
}

async fn dispatch(
    provider: &TempUrlProvider,
    route: TempUrlRoute,
    requestor: &str,
    body: &[u8],
    request_id: &str,
) -> Result<http::Response<TempUrlResponseBody>, TempUrlError> {
    match route {
        TempUrlRoute::CreateUrl => {
            let input: UrlRequest = deserialize(body)?;
            let url = provider.create_url(requestor, input).await?;
            created_response(&url, &url.url, request_id)
        }
        TempUrlRoute::SetKey { name } => {
            let input = deserialize(body)?;
            let view = provider.set_key(requestor, &name, input).await?;
            json_response(http::StatusCode::OK, &view, request_id)
        }
        TempUrlRoute::RemoveKey { name } => {
            provider.remove_key(requestor, &name).await?;
            Ok(no_content_response(request_id))
        }
    }
}

fn deserialize<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, TempUrlError> {
    serde_json::from_slice(body)
        .map_err(|e| TempUrlError::invalid_request(format!("invalid request body: {e}")))
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use tempurl_core::{Account, TempUrlConfig};
    use tempurl_store::{AccessRule, MemoryStore};

    use super::*;

    fn handler() -> TempUrlBrokerHandler {
        let store = MemoryStore::new();
        store
            .add_account(Account::new("acme-key", "acme", "acme-secret"))
            .unwrap();
        store
            .add_rule(AccessRule {
                granting_account: "acme-key".into(),
                requestor_api_key: "app1".into(),
                container_pattern: "logs".into(),
                object_pattern: ".*".into(),
                method: "GET".into(),
                max_duration: None,
            })
            .unwrap();
        let store = Arc::new(store);
        let provider = TempUrlProvider::new(TempUrlConfig::default(), store.clone(), store);
        TempUrlBrokerHandler::new(Arc::new(provider))
    }

    async fn call(
        handler: &TempUrlBrokerHandler,
        route: TempUrlRoute,
        requestor: &str,
        body: &'static str,
    ) -> Result<http::Response<TempUrlResponseBody>, TempUrlError> {
        handler
            .handle_route(
                route,
                requestor.to_owned(),
                Bytes::from_static(body.as_bytes()),
                "req-1".to_owned(),
            )
            .await
    }

    fn set_key() -> TempUrlRoute {
        TempUrlRoute::SetKey {
            name: "acme".into(),
        }
    }

    #[tokio::test]
    async fn test_should_set_key_and_create_url() {
        let handler = handler();

        let resp = call(&handler, set_key(), "acme-key", r#"{"key":"S"}"#)
            .await
            .unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let view: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(view, serde_json::json!({"id": "acme-key", "name": "acme"}));

        let body = r#"{"account":"acme","container":"logs","object":"a.log","method":"GET"}"#;
        let resp = call(&handler, TempUrlRoute::CreateUrl, "app1", body)
            .await
            .unwrap();
        assert_eq!(resp.status(), http::StatusCode::CREATED);
        let location = resp.headers()[http::header::LOCATION]
            .to_str()
            .unwrap()
            .to_owned();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let url: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(url["url"], location);
        assert_eq!(url["path"], "/v1/acme/logs/a.log");
        assert!(location.starts_with("http://localhost:8081/v1/acme/logs/a.log?temp_url_sig="));
    }

    #[tokio::test]
    async fn test_should_remove_key_with_no_content() {
        let handler = handler();
        call(&handler, set_key(), "acme-key", r#"{"key":"S"}"#)
            .await
            .unwrap();
        let route = TempUrlRoute::RemoveKey {
            name: "acme".into(),
        };
        let resp = call(&handler, route, "acme-key", "").await.unwrap();
        assert_eq!(resp.status(), http::StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_should_reject_malformed_body() {
        let handler = handler();
        for body in ["", "not json", "[1,2]"] {
            let err = call(&handler, TempUrlRoute::CreateUrl, "app1", body)
                .await
                .unwrap_err();
            assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST, "{body:?}");
        }
        let err = call(&handler, set_key(), "acme-key", "{")
            .await
            .unwrap_err();
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_should_reject_missing_fields() {
        let err = call(&handler(), TempUrlRoute::CreateUrl, "app1", r#"{"account":"acme"}"#)
            .await
            .unwrap_err();
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "missing required field: container");
    }
}
