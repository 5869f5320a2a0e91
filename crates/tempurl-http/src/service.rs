//! Broker HTTP service implementing the hyper `Service` trait.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use tempurl_auth::HmacAuthenticator;
use tempurl_core::TempUrlError;
use tracing::{debug, error, warn};

use crate::body::TempUrlResponseBody;
use crate::dispatch::{TempUrlHandler, dispatch_route};
use crate::response::{REQUEST_ID_HEADER, error_to_response, json_response};
use crate::router::{is_health_check, resolve_route};

/// Value of the `Server` header on every response.
const SERVER_NAME: &str = "tempurl";

/// Configuration for the broker HTTP service.
#[derive(Clone)]
pub struct TempUrlHttpConfig {
    /// Verifies every `/v1` request before routing.
    pub authenticator: Arc<HmacAuthenticator>,
}

impl std::fmt::Debug for TempUrlHttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TempUrlHttpConfig")
            .field("authenticator", &self.authenticator)
            .finish()
    }
}

/// Hyper `Service` for the broker.
///
/// Every request except the health probe is authenticated first. Routing
/// happens only after authentication, so unauthenticated callers learn
/// nothing about which paths exist.
#[derive(Debug)]
pub struct TempUrlHttpService<H: TempUrlHandler> {
    handler: Arc<H>,
    config: Arc<TempUrlHttpConfig>,
}

impl<H: TempUrlHandler> TempUrlHttpService<H> {
    /// Create a new service.
    pub fn new(handler: Arc<H>, config: TempUrlHttpConfig) -> Self {
        Self {
            handler,
            config: Arc::new(config),
        }
    }

    /// Run a request with an already collected body through the pipeline.
    pub async fn handle(
        &self,
        parts: http::request::Parts,
        body: Bytes,
        request_id: &str,
    ) -> http::Response<TempUrlResponseBody> {
        let response = process_request(
            parts,
            body,
            self.handler.as_ref(),
            &self.config,
            request_id,
        )
        .await;
        add_common_headers(response, request_id)
    }
}

impl<H: TempUrlHandler> Clone for TempUrlHttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            config: Arc::clone(&self.config),
        }
    }
}

impl<H: TempUrlHandler> hyper::service::Service<http::Request<Incoming>>
    for TempUrlHttpService<H>
{
    type Response = http::Response<TempUrlResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();
        let request_id = uuid::Uuid::new_v4().to_string();

        Box::pin(async move {
            let (parts, incoming) = req.into_parts();
            let response = match collect_body(incoming).await {
                Ok(body) => service.handle(parts, body, &request_id).await,
                Err(err) => add_common_headers(error_response(&err, &request_id), &request_id),
            };
            Ok(response)
        })
    }
}

/// Process a single request through the full pipeline.
async fn process_request<H: TempUrlHandler>(
    parts: http::request::Parts,
    body: Bytes,
    handler: &H,
    config: &TempUrlHttpConfig,
    request_id: &str,
) -> http::Response<TempUrlResponseBody> {
    // 1. Liveness probe, unauthenticated.
    if is_health_check(&parts.method, parts.uri.path()) {
        return health_response(request_id);
    }

    // 2. Authenticate against the exact bytes that will be handed on.
    let auth = match config.authenticator.authenticate(&parts, &body).await {
        Ok(auth) => auth,
        Err(e) if e.is_upstream() => {
            let err = TempUrlError::upstream("authentication backend unavailable");
            error!(request_id, error = %e, "secret resolution failed");
            return error_response(&err, request_id);
        }
        Err(e) => {
            warn!(
                request_id,
                method = %parts.method,
                path = parts.uri.path(),
                error = %e,
                "authentication failed"
            );
            return error_response(&TempUrlError::unauthenticated(), request_id);
        }
    };

    // 3. Route.
    let route = match resolve_route(&parts.method, parts.uri.path()) {
        Ok(route) => route,
        Err(err) => return error_response(&err, request_id),
    };

    // 4. Dispatch to handler.
    match dispatch_route(handler, route, auth.api_key, body, request_id.to_owned()).await {
        Ok(response) => response,
        Err(err) => error_response(&err, request_id),
    }
}

/// Log an error at a level matching its status and render it.
fn error_response(err: &TempUrlError, request_id: &str) -> http::Response<TempUrlResponseBody> {
    if err.is_server_error() {
        error!(request_id, code = %err.code, message = %err.message, "request failed");
    } else {
        debug!(request_id, code = %err.code, message = %err.message, "request rejected");
    }
    error_to_response(err, request_id)
}

fn health_response(request_id: &str) -> http::Response<TempUrlResponseBody> {
    let status = serde_json::json!({ "status": "running" });
    json_response(http::StatusCode::OK, &status, request_id)
        .unwrap_or_else(|err| error_to_response(&err, request_id))
}

/// Collect the incoming body into a single `Bytes` buffer.
async fn collect_body(incoming: Incoming) -> Result<Bytes, TempUrlError> {
    incoming
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| TempUrlError::invalid_request(format!("failed to read request body: {e}")))
}

/// Add common response headers to every response.
fn add_common_headers(
    mut response: http::Response<TempUrlResponseBody>,
    request_id: &str,
) -> http::Response<TempUrlResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.entry(REQUEST_ID_HEADER).or_insert(hv);
    }

    headers.insert(
        http::header::SERVER,
        http::HeaderValue::from_static(SERVER_NAME),
    );

    response
}
