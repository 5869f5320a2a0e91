//! Handler trait and route dispatch.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use tempurl_core::TempUrlError;

use crate::body::TempUrlResponseBody;
use crate::router::TempUrlRoute;

/// A boxed handler future.
pub type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<http::Response<TempUrlResponseBody>, TempUrlError>> + Send>>;

/// Trait the broker business logic implements.
///
/// The handler receives an already authenticated caller, the resolved route
/// and the exact body bytes that were authenticated.
pub trait TempUrlHandler: Send + Sync + 'static {
    /// Handle one operation and produce an HTTP response.
    fn handle_route(
        &self,
        route: TempUrlRoute,
        requestor: String,
        body: Bytes,
        request_id: String,
    ) -> HandlerFuture;
}

/// Dispatch a route to the handler.
pub async fn dispatch_route<H: TempUrlHandler>(
    handler: &H,
    route: TempUrlRoute,
    requestor: String,
    body: Bytes,
    request_id: String,
) -> Result<http::Response<TempUrlResponseBody>, TempUrlError> {
    tracing::debug!(route = %route, requestor = %requestor, "dispatching broker operation");
    handler.handle_route(route, requestor, body, request_id).await
}
