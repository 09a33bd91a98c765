//! Configuration schema definitions.
//!
//! All types derive Serde traits so a partial TOML file only needs the keys
//! it changes.

use serde::{Deserialize, Serialize};

/// Root configuration for the TG proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Upstream host and request shape.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port. Overridden by the `PORT` environment variable.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7070,
        }
    }
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Scheme and authority of the upstream, without the `/s/` prefix.
    pub base_url: String,

    /// Maximum number of redirects followed per forwarded request.
    pub max_redirects: usize,

    /// Path probed by `GET /test`.
    pub probe_path: String,

    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` for outbound calls.
    pub use_system_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://t.me".to_string(),
            max_redirects: 5,
            probe_path: "/s/telegram".to_string(),
            use_system_proxy: true,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time for one forwarded upstream call, in seconds.
    pub forward_secs: u64,

    /// Total time for the `/test` probe, in seconds.
    pub probe_secs: u64,

    /// Inbound request deadline enforced by the server, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            forward_secs: 30,
            probe_secs: 10,
            request_secs: 35,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Output format for the tracing subscriber.
    pub log_format: LogFormat,

    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,

    /// Expose a Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Bind address for the metrics endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upstream_contract() {
        let config = ProxyConfig::default();
        assert_eq!(config.listener.bind_address(), "0.0.0.0:7070");
        assert_eq!(config.upstream.base_url, "https://t.me");
        assert_eq!(config.upstream.max_redirects, 5);
        assert_eq!(config.timeouts.forward_secs, 30);
        assert_eq!(config.timeouts.probe_secs, 10);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [listener]
            port = 8080

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.listener.host, "0.0.0.0");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.upstream, UpstreamConfig::default());
    }
}
