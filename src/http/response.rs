//! Response shaping shared by the handlers.
//!
//! # Responsibilities
//! - Build the JSON `{error, message}` envelope used for local failures
//! - Stamp relayed upstream responses with content-type, cache and CORS headers
//!
//! Upstream error responses are relayed as-is and never pass through the
//! JSON envelope.

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Content type used when the upstream sends none.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html";

const NO_CACHE: &str = "no-cache";
const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// JSON error envelope.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Respond with `status` and an `{error, message}` JSON body.
pub fn json_error(
    status: StatusCode,
    error: impl Into<String>,
    message: impl Into<String>,
) -> Response {
    let body = ErrorBody {
        error: error.into(),
        message: message.into(),
    };
    (status, Json(body)).into_response()
}

/// Set the headers every successful relay carries.
pub fn apply_relay_headers(headers: &mut HeaderMap, content_type: HeaderValue) {
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}
