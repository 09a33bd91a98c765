//! Route handlers.

use std::any::Any;
use std::time::Instant;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;

use crate::http::request::request_id;
use crate::http::response::json_error;
use crate::http::server::AppState;
use crate::proxy::target::{parse_query, wildcard_segment};

/// Service name reported by `/health`.
pub const SERVICE_NAME: &str = "TG Proxy Server";

/// Routes listed in 404 responses.
pub const AVAILABLE_ROUTES: [&str; 4] = ["GET /", "GET /health", "GET /test", "GET /tg/s/*"];

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: String,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFound {
    pub error: &'static str,
    pub message: String,
    pub available_routes: [&'static str; 4],
}

/// `GET /tg/s/*`: forward to the upstream channel page.
pub async fn forward(State(state): State<AppState>, uri: Uri, headers: HeaderMap) -> Response {
    let Some(wildcard) = wildcard_segment(uri.path()) else {
        return not_found(uri.clone()).await.into_response();
    };
    let query = parse_query(uri.query());
    let start = Instant::now();

    match state.forwarder.forward(wildcard, &query).await {
        Ok(relayed) => {
            tracing::info!(
                request_id = %request_id(&headers),
                status = %relayed.status,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Proxy request completed"
            );
            relayed.into_response()
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id(&headers),
                url = %uri,
                kind = e.kind(),
                status = %e.status(),
                error = %e,
                "Proxy request failed"
            );
            e.into_response()
        }
    }
}

/// `GET /health`: static liveness report.
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /test`: one-shot upstream connectivity check.
pub async fn probe(State(state): State<AppState>) -> Response {
    match state.forwarder.probe().await {
        Ok(report) => report.into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Connectivity probe failed");
            e.into_response()
        }
    }
}

/// `GET /`: usage documentation.
pub async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "message": "TG proxy server is running",
        "usage": {
            "proxy": "GET /tg/s/{channel_id}?q={search_term}",
            "health": "GET /health",
            "test": "GET /test",
        },
        "examples": [
            "/tg/s/zyfb123",
            "/tg/s/zyfb123?q=复仇者联盟",
            "/tg/s/zyfb123?before=123456",
        ],
        "note": "All request parameters are forwarded unchanged to t.me",
    }))
}

/// Fallback for unknown paths and unsupported methods.
pub async fn not_found(uri: Uri) -> (StatusCode, Json<NotFound>) {
    (
        StatusCode::NOT_FOUND,
        Json(NotFound {
            error: "Route not found",
            message: format!("Path {} not found", uri.path()),
            available_routes: AVAILABLE_ROUTES,
        }),
    )
}

/// Turn a handler panic into a 500 JSON response.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(error = %message, "Unhandled error in request handler");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn health_timestamp_is_iso8601_utc() {
        let Json(status) = health().await;
        assert_eq!(status.status, "ok");
        assert_eq!(status.service, SERVICE_NAME);
        assert_eq!(status.version, "1.0.0");
        assert!(status.timestamp.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&status.timestamp).is_ok());
    }

    #[test]
    fn panic_payloads_become_messages() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = panic_response(Box::new(String::from("owned boom")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn not_found_names_the_path() {
        let (status, Json(body)) = not_found(Uri::from_static("/foo?x=1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.message, "Path /foo not found");
        assert_eq!(body.available_routes.len(), 4);
    }
}
