//! The forwarding core.
//!
//! # Responsibilities
//! - Hold the pre-built outbound clients (forward and probe)
//! - Issue exactly one upstream GET per inbound request, never retried
//! - Classify the outcome into a relay or a [`ForwardError`]

use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use reqwest::redirect::Policy;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::http::response::{apply_relay_headers, DEFAULT_CONTENT_TYPE};
use crate::observability::metrics;
use crate::proxy::error::ForwardError;
use crate::proxy::target::build_target_url;

/// User-Agent sent on forwarded requests.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// User-Agent sent by the connectivity probe.
pub const PROBE_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// The browser-like header set the upstream expects.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(
        header::ACCEPT_ENCODING,
        HeaderValue::from_static("gzip, deflate, br"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers
}

/// A successful upstream exchange, ready to be relayed.
#[derive(Debug)]
pub struct Relayed {
    pub status: StatusCode,
    pub content_type: HeaderValue,
    pub body: Bytes,
}

impl IntoResponse for Relayed {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        apply_relay_headers(response.headers_mut(), self.content_type);
        response
    }
}

/// Result of a successful `/test` probe.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub status: &'static str,
    pub message: &'static str,
    pub status_code: u16,
    pub content_length: usize,
}

impl IntoResponse for ProbeReport {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Request failed with status code {}", .0.as_u16())]
    Status(StatusCode),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl IntoResponse for ProbeError {
    fn into_response(self) -> Response {
        let body = json!({
            "status": "error",
            "message": "TG connection failed",
            "error": self.to_string(),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Forwarder to the fixed upstream host.
///
/// Holds no mutable state; clones share the underlying connection pools.
#[derive(Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    probe_client: reqwest::Client,
    base_url: String,
    probe_path: String,
}

impl Forwarder {
    /// Build the outbound clients from configuration.
    pub fn new(
        upstream: &UpstreamConfig,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, reqwest::Error> {
        let mut forward = reqwest::Client::builder()
            .default_headers(browser_headers())
            .timeout(Duration::from_secs(timeouts.forward_secs))
            .redirect(Policy::limited(upstream.max_redirects));

        let mut probe = reqwest::Client::builder()
            .user_agent(PROBE_USER_AGENT)
            .timeout(Duration::from_secs(timeouts.probe_secs));

        if !upstream.use_system_proxy {
            forward = forward.no_proxy();
            probe = probe.no_proxy();
        }

        Ok(Self {
            client: forward.build()?,
            probe_client: probe.build()?,
            base_url: upstream.base_url.clone(),
            probe_path: upstream.probe_path.clone(),
        })
    }

    /// Target URL for a wildcard segment and query.
    pub fn target_url(&self, wildcard: &str, query: &[(String, String)]) -> String {
        build_target_url(&self.base_url, wildcard, query)
    }

    /// Forward one request to the upstream and collect its response.
    pub async fn forward(
        &self,
        wildcard: &str,
        query: &[(String, String)],
    ) -> Result<Relayed, ForwardError> {
        let start = Instant::now();
        let target = self.target_url(wildcard, query);

        tracing::info!(url = %target, "Forwarding request");

        let result = self.fetch(&target).await;

        match &result {
            Ok(relayed) => {
                tracing::debug!(
                    url = %target,
                    status = %relayed.status,
                    bytes = relayed.body.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Upstream responded"
                );
                metrics::record_forward("success", relayed.status.as_u16(), start);
            }
            Err(e) => {
                metrics::record_forward(e.kind(), e.status().as_u16(), start);
            }
        }

        result
    }

    async fn fetch(&self, target: &str) -> Result<Relayed, ForwardError> {
        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| ForwardError::from_reqwest(&e))?;

        let status = response.status();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        let body = response
            .bytes()
            .await
            .map_err(|e| ForwardError::from_reqwest(&e))?;

        if status.is_success() || status.is_redirection() {
            Ok(Relayed {
                status,
                content_type: content_type
                    .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE)),
                body,
            })
        } else {
            Err(ForwardError::Upstream {
                status,
                content_type,
                body,
            })
        }
    }

    /// One-shot connectivity check against the probe path.
    pub async fn probe(&self) -> Result<ProbeReport, ProbeError> {
        let target = format!("{}{}", self.base_url.trim_end_matches('/'), self.probe_path);
        let response = self.probe_client.get(&target).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status));
        }

        let body = response.bytes().await?;
        Ok(ProbeReport {
            status: "success",
            message: "TG connection OK",
            status_code: status.as_u16(),
            content_length: body.len(),
        })
    }
}
