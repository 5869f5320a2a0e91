//! Response formatting.
//!
//! Success bodies are plain JSON documents; errors are always
//! `{"error": "<message>"}`.

use tempurl_core::TempUrlError;

use crate::body::TempUrlResponseBody;

/// Header carrying the per-request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Serialize an error into its JSON body.
#[must_use]
pub fn error_to_json(error: &TempUrlError) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({ "error": error.message }))
        .expect("JSON serialization of error cannot fail")
}

/// Convert a [`TempUrlError`] into a complete HTTP response.
#[must_use]
pub fn error_to_response(
    error: &TempUrlError,
    request_id: &str,
) -> http::Response<TempUrlResponseBody> {
    http::Response::builder()
        .status(error.status_code)
        .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .header(REQUEST_ID_HEADER, request_id)
        .body(TempUrlResponseBody::from_bytes(error_to_json(error)))
        .expect("valid error response")
}

/// Serialize `value` into a JSON response with the given status.
pub fn json_response<T: serde::Serialize>(
    status: http::StatusCode,
    value: &T,
    request_id: &str,
) -> Result<http::Response<TempUrlResponseBody>, TempUrlError> {
    let json = serde_json::to_vec(value).map_err(|e| {
        TempUrlError::internal_error(format!("failed to serialize response: {e}"))
    })?;
    Ok(http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .header(REQUEST_ID_HEADER, request_id)
        .body(TempUrlResponseBody::from_bytes(json))
        .expect("valid JSON response"))
}

/// A `201 Created` JSON response pointing at `location`.
pub fn created_response<T: serde::Serialize>(
    value: &T,
    location: &str,
    request_id: &str,
) -> Result<http::Response<TempUrlResponseBody>, TempUrlError> {
    let mut response = json_response(http::StatusCode::CREATED, value, request_id)?;
    let location = http::HeaderValue::from_str(location).map_err(|e| {
        TempUrlError::internal_error(format!("location is not a valid header value: {e}"))
    })?;
    response
        .headers_mut()
        .insert(http::header::LOCATION, location);
    Ok(response)
}

/// A `204 No Content` response.
#[must_use]
pub fn no_content_response(request_id: &str) -> http::Response<TempUrlResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::NO_CONTENT)
        .header(REQUEST_ID_HEADER, request_id)
        .body(TempUrlResponseBody::empty())
        .expect("valid empty response")
}
