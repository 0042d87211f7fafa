//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod client;
pub mod logging;

use std::path::Path;

use serde::{Deserialize, Serialize};

use self::client::ClientSettings;
use self::logging::LoggingConfig;

use crate::error::AppError;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "SENTINEL";

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Live-update client settings.
    #[serde(default)]
    pub client: ClientSettings,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `SENTINEL__`. Missing files
    /// are skipped; every field falls back to its default.
    pub fn load(env: &str) -> Result<Self, AppError> {
        tracing::debug!(env, "Loading configuration");

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        parsed.validate()?;
        tracing::debug!(env, url = %parsed.client.url, "Configuration loaded");
        Ok(parsed)
    }

    /// Load configuration from a single TOML file, without overlays.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Loading configuration file");

        let config = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .build()
            .map_err(|e| {
                AppError::configuration(format!(
                    "Failed to read config '{}': {e}",
                    path.display()
                ))
            })?;

        let parsed: Self = config.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Check cross-field constraints the deserializer cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        self.client.validate()?;
        self.logging.validate()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.client.reconnect_delay_ms, 3000);
        assert_eq!(config.client.max_reconnect_attempts, 5);
    }

    #[test]
    fn test_from_file_fills_missing_fields() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[client]\nurl = \"ws://127.0.0.1:3000/ws\"\nmax_reconnect_attempts = 2\n\n[logging]\nformat = \"json\""
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.client.url, "ws://127.0.0.1:3000/ws");
        assert_eq!(config.client.max_reconnect_attempts, 2);
        assert_eq!(config.client.reconnect_delay_ms, 3000);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_from_file_logs_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[client]\nurl = \"ws://127.0.0.1:3000/ws\"").unwrap();

        AppConfig::from_file(file.path()).unwrap();
        assert!(logs_contain("Loading configuration file"));
    }

    #[test]
    fn test_from_file_rejects_bad_scheme() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[client]\nurl = \"http://127.0.0.1:3000/ws\"").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }
}
