//! Forwarding failure taxonomy.
//!
//! Classification order is fixed: an upstream status wins, then timeouts,
//! then connect failures, and everything else is `Unknown`.

use axum::{
    body::Bytes,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::http::response::{json_error, DEFAULT_CONTENT_TYPE};

#[derive(Debug, Error)]
pub enum ForwardError {
    /// Upstream answered outside 2xx/3xx. Relayed verbatim.
    #[error("upstream responded with status {status}")]
    Upstream {
        status: StatusCode,
        content_type: Option<HeaderValue>,
        body: Bytes,
    },

    #[error("request timeout")]
    Timeout,

    #[error("cannot connect to target server: {0}")]
    Unreachable(String),

    #[error("{0}")]
    Unknown(String),
}

impl ForwardError {
    /// Map a transport-level client error onto the taxonomy.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            ForwardError::Timeout
        } else if err.is_connect() {
            ForwardError::Unreachable(err.to_string())
        } else {
            ForwardError::Unknown(err.to_string())
        }
    }

    /// Status code the client will see.
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::Upstream { status, .. } => *status,
            ForwardError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ForwardError::Unreachable(_) => StatusCode::BAD_GATEWAY,
            ForwardError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Upstream { .. } => "upstream",
            ForwardError::Timeout => "timeout",
            ForwardError::Unreachable(_) => "unreachable",
            ForwardError::Unknown(_) => "unknown",
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ForwardError::Upstream {
                content_type, body, ..
            } => {
                let content_type = content_type
                    .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
                let mut response = (status, body).into_response();
                response
                    .headers_mut()
                    .insert(header::CONTENT_TYPE, content_type);
                response
            }
            ForwardError::Timeout => {
                json_error(status, "Upstream request timed out", "Request timeout")
            }
            ForwardError::Unreachable(_) => json_error(
                status,
                "Cannot reach target server",
                "Cannot connect to target server",
            ),
            ForwardError::Unknown(message) => json_error(status, "Proxy server error", message),
        }
    }
}
