use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::Config;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/skeleton-loader/config.toml` on Unix/macOS,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("skeleton-loader").join("config.toml")
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`.
    ///
    /// - If the file doesn't exist, returns `Config::default()`.
    /// - Otherwise parses it as TOML and validates.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The grace period is non-zero
    /// - Target names are non-empty and unique
    /// - Target URLs use http or https
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loader.timeout_ms == 0 {
            return Err(ConfigError::ValidationError {
                message: "loader.timeout_ms must be greater than zero".to_string(),
            });
        }

        for (index, target) in self.targets.iter().enumerate() {
            if target.name.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    message: format!("Target #{} has an empty name", index + 1),
                });
            }

            if !(target.url.starts_with("http://") || target.url.starts_with("https://")) {
                return Err(ConfigError::ValidationError {
                    message: format!(
                        "Target '{}' has unsupported URL '{}'",
                        target.name, target.url
                    ),
                });
            }

            if self.targets[..index].iter().any(|t| t.name == target.name) {
                return Err(ConfigError::ValidationError {
                    message: format!("Duplicate target '{}'", target.name),
                });
            }
        }

        Ok(())
    }
}
