//! Configuration validation.
//!
//! Serde handles the syntax; this module checks value ranges. All errors are
//! collected so a bad file reports everything at once.

use std::fmt;

use url::Url;

use crate::config::schema::ProxyConfig;

/// Upper bound on `upstream.max_redirects`.
pub const MAX_REDIRECT_LIMIT: usize = 20;

/// A single semantic problem in a [`ProxyConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::new("listener.port", "must be non-zero"));
    }
    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::new("listener.host", "must not be empty"));
    }

    match Url::parse(&config.upstream.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
            if url.host_str().is_none() {
                errors.push(ValidationError::new("upstream.base_url", "missing host"));
            }
        }
        Ok(url) => errors.push(ValidationError::new(
            "upstream.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("upstream.base_url", e.to_string())),
    }

    if config.upstream.max_redirects > MAX_REDIRECT_LIMIT {
        errors.push(ValidationError::new(
            "upstream.max_redirects",
            format!("must be at most {MAX_REDIRECT_LIMIT}"),
        ));
    }
    if !config.upstream.probe_path.starts_with('/') {
        errors.push(ValidationError::new("upstream.probe_path", "must start with '/'"));
    }

    for (field, secs) in [
        ("timeouts.forward_secs", config.timeouts.forward_secs),
        ("timeouts.probe_secs", config.timeouts.probe_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ] {
        if secs == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
