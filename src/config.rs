//! Configuration schema, loading, and validation.
//!
//! # Responsibilities
//! - Define the configuration structure for the server and client binaries
//! - Load configuration from an optional TOML file
//! - Resolve the listening/target port from the `PORT` environment variable
//! - Semantic validation (serde handles syntactic)
//!
//! # Design Decisions
//! - All sections have defaults, so a config file is never required
//! - Port resolution falls back to 8080 on a missing or unparseable `PORT`
//! - Validation returns all errors, not just the first

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Port used when neither the CLI, the environment, nor a config file
/// provides one.
pub const DEFAULT_PORT: u16 = 8080;

/// Root configuration shared by the server and client binaries.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Slow server settings.
    pub server: ServerConfig,

    /// Client request settings.
    pub client: ClientConfig,
}

/// Slow server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on (loopback only). Port 0 requests an ephemeral port.
    pub port: u16,

    /// Pause between body chunk writes in milliseconds.
    pub chunk_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            chunk_interval_ms: 400,
        }
    }
}

/// Client request configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Request timeout in milliseconds. `None` disables the timeout.
    pub timeout_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Some(1000),
        }
    }
}

/// A single semantic validation failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("server.chunk_interval_ms must be greater than zero")]
    ZeroChunkInterval,
    #[error("client.timeout_ms must be greater than zero when set")]
    ZeroTimeout,
}

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Validate semantic constraints, collecting every violation.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.chunk_interval_ms == 0 {
        errors.push(ValidationError::ZeroChunkInterval);
    }

    if config.client.timeout_ms == Some(0) {
        errors.push(ValidationError::ZeroTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: AppConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a raw port value. Empty, absent, or non-numeric input yields `None`
/// so callers can fall through to their configured default.
pub fn parse_port(raw: Option<String>) -> Option<u16> {
    raw.and_then(|value| value.trim().parse().ok())
}

/// Read the port override from the `PORT` environment variable.
pub fn port_from_env() -> Option<u16> {
    parse_port(std::env::var("PORT").ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_port_accepts_integers() {
        assert_eq!(parse_port(Some("9090".into())), Some(9090));
        assert_eq!(parse_port(Some(" 9090 ".into())), Some(9090));
    }

    #[test]
    fn parse_port_rejects_garbage() {
        assert_eq!(parse_port(Some("not-a-port".into())), None);
        assert_eq!(parse_port(Some("".into())), None);
        assert_eq!(parse_port(Some("70000".into())), None);
        assert_eq!(parse_port(None), None);
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.chunk_interval_ms, 400);
        assert_eq!(config.client.timeout_ms, Some(1000));
    }

    #[test]
    fn toml_overrides_defaults() {
        let config: AppConfig = toml::from_str(
            "[server]\nport = 9000\nchunk_interval_ms = 50\n\n[client]\ntimeout_ms = 250\n",
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.chunk_interval_ms, 50);
        assert_eq!(config.client.timeout_ms, Some(250));
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: AppConfig = toml::from_str("[server]\nport = 9000\n").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.chunk_interval_ms, 400);
        assert_eq!(config.client.timeout_ms, Some(1000));
    }

    #[test]
    fn validation_collects_every_error() {
        let mut config = AppConfig::default();
        config.server.chunk_interval_ms = 0;
        config.client.timeout_ms = Some(0);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroChunkInterval,
                ValidationError::ZeroTimeout
            ]
        );
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }
}
