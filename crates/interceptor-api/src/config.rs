//! Configuration types and loading for the HTTP service

use interceptor_core::interception::{CommitFallback, InterceptionOptions};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Name of the optional deployment-local configuration file, without extension.
pub const DEFAULT_CONFIG_FILE: &str = "config/interceptor";

/// Prefix for environment overrides, e.g. `INTERCEPTOR__SERVER__PORT=9090`.
pub const ENV_PREFIX: &str = "INTERCEPTOR";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Service configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Interception settings
    pub interception: InterceptionConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Check the configuration for values the service cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::invalid("server.port must be non-zero"));
        }
        if self.server.max_body_size == 0 {
            return Err(ConfigError::invalid("server.max_body_size must be non-zero"));
        }
        if !self.interception.endpoint_path.starts_with('/') {
            return Err(ConfigError::invalid(format!(
                "interception.endpoint_path must start with '/', got '{}'",
                self.interception.endpoint_path
            )));
        }
        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::invalid(format!(
                "logging.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.level
            )));
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Maximum request size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_seconds: 30,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Interception endpoint configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptionConfig {
    /// Path that receives hook deliveries
    pub endpoint_path: String,

    /// Commit reported for pushes without a head commit
    pub push_commit_fallback: CommitFallback,
}

impl InterceptionConfig {
    pub fn options(&self) -> InterceptionOptions {
        InterceptionOptions {
            push_commit_fallback: self.push_commit_fallback,
        }
    }
}

impl Default for InterceptionConfig {
    fn default() -> Self {
        Self {
            endpoint_path: "/".to_string(),
            push_commit_fallback: CommitFallback::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Load the service configuration.
///
/// Sources, later ones overriding earlier ones:
///
/// 1. `config/interceptor.yaml`, if present
/// 2. `explicit_path`, which must exist when given
/// 3. `INTERCEPTOR__`-prefixed environment variables, `__` separating sections
///
/// Every field has a default, so no sources at all yields
/// [`ServiceConfig::default`]. The result is not validated.
///
/// # Errors
///
/// Returns [`ConfigError::Load`] when a file is missing or malformed, or an
/// override cannot be converted to the field's type.
pub fn load_config(explicit_path: Option<&str>) -> Result<ServiceConfig, ConfigError> {
    let mut builder = config::Config::builder().add_source(
        config::File::with_name(DEFAULT_CONFIG_FILE)
            .required(false)
            .format(config::FileFormat::Yaml),
    );

    if let Some(path) = explicit_path.filter(|p| !p.is_empty()) {
        info!(path = %path, "Loading configuration from explicit path");
        builder = builder.add_source(
            config::File::with_name(path)
                .required(true)
                .format(config::FileFormat::Yaml),
        );
    }

    let config = builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    Ok(config.try_deserialize()?)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
