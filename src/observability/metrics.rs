//! Metrics collection and exposition.
//!
//! # Metrics
//! - `tg_proxy_forward_total` (counter): forwards by outcome, status
//! - `tg_proxy_forward_duration_seconds` (histogram): upstream latency
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

/// Record one forwarded request.
pub fn record_forward(outcome: &'static str, status: u16, start: Instant) {
    let status = status.to_string();
    ::metrics::counter!(
        "tg_proxy_forward_total",
        "outcome" => outcome,
        "status" => status.clone()
    )
    .increment(1);
    ::metrics::histogram!(
        "tg_proxy_forward_duration_seconds",
        "outcome" => outcome,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}
