//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable selecting the listening port.
pub const PORT_ENV: &str = "PORT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid {name} value '{value}'")]
    Env { name: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read a TOML file into a config without validating it.
pub fn read_config_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(PORT_ENV) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            config.listener.port = trimmed.parse().map_err(|_| ConfigError::Env {
                name: PORT_ENV,
                value: raw.clone(),
            })?;
        }
    }
    Ok(())
}

/// Build the effective configuration: defaults, then the optional file, then
/// the process environment, then an explicit port from the command line.
pub fn load_config(path: Option<&Path>, port: Option<u16>) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    if let Some(port) = port {
        config.listener.port = port;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
