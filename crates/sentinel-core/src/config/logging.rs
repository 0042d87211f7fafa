//! Logging configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Logging and tracing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive: `"trace"`, `"debug"`, `"info"`,
    /// `"warn"`, `"error"`, or an `EnvFilter` expression.
    #[serde(default = "default_level")]
    pub level: String,
    /// Log format: `"json"` or `"pretty"`.
    #[serde(default = "default_format")]
    pub format: String,
}

impl LoggingConfig {
    /// Whether JSON output was requested.
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }

    pub(crate) fn validate(&self) -> Result<(), AppError> {
        match self.format.to_ascii_lowercase().as_str() {
            "json" | "pretty" => Ok(()),
            other => Err(AppError::configuration(format!(
                "Unknown log format '{other}' (expected 'json' or 'pretty')"
            ))),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}
