//! Live-update client configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Settings for the WebSocket live-update client.
///
/// These are the file/environment representation. The realtime crate
/// converts them into its runtime client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    /// WebSocket endpoint (`ws://` or `wss://`).
    #[serde(default = "default_url")]
    pub url: String,
    /// Base delay before the first reconnect attempt, in milliseconds.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
    /// Reconnect attempts allowed before the client gives up.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// Upper bound for the exponential backoff delay, in milliseconds.
    #[serde(default = "default_max_reconnect_delay")]
    pub max_reconnect_delay_ms: u64,
    /// How long the opening handshake may take, in milliseconds.
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_ms: u64,
    /// How long `close()` waits for the close acknowledgment, in milliseconds.
    #[serde(default = "default_close_timeout")]
    pub close_timeout_ms: u64,
    /// Largest inbound text frame accepted, in bytes.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl ClientSettings {
    /// Validate the endpoint and timing values.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.url.trim().is_empty() {
            return Err(AppError::configuration("client.url must not be empty"));
        }
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(AppError::configuration(format!(
                "client.url '{}' must use the ws:// or wss:// scheme",
                self.url
            )));
        }
        if self.reconnect_delay_ms == 0 {
            return Err(AppError::configuration(
                "client.reconnect_delay_ms must be greater than zero",
            ));
        }
        if self.max_reconnect_delay_ms < self.reconnect_delay_ms {
            return Err(AppError::configuration(
                "client.max_reconnect_delay_ms must not be below client.reconnect_delay_ms",
            ));
        }
        if self.handshake_timeout_ms == 0 {
            return Err(AppError::configuration(
                "client.handshake_timeout_ms must be greater than zero",
            ));
        }
        if self.max_frame_bytes == 0 {
            return Err(AppError::configuration(
                "client.max_frame_bytes must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            url: default_url(),
            reconnect_delay_ms: default_reconnect_delay(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            max_reconnect_delay_ms: default_max_reconnect_delay(),
            handshake_timeout_ms: default_handshake_timeout(),
            close_timeout_ms: default_close_timeout(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

fn default_url() -> String {
    "ws://127.0.0.1:3000/ws".to_string()
}

fn default_reconnect_delay() -> u64 {
    3000
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_max_reconnect_delay() -> u64 {
    30_000
}

fn default_handshake_timeout() -> u64 {
    10_000
}

fn default_close_timeout() -> u64 {
    5000
}

fn default_max_frame_bytes() -> usize {
    65_536
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_url() {
        let settings = ClientSettings {
            url: "  ".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_accepts_secure_scheme() {
        let settings = ClientSettings {
            url: "wss://sentinel.example.com/ws".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_handshake_timeout() {
        let settings = ClientSettings {
            handshake_timeout_ms: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
        assert_eq!(ClientSettings::default().handshake_timeout_ms, 10_000);
    }

    #[test]
    fn test_rejects_zero_delay() {
        let settings = ClientSettings {
            reconnect_delay_ms: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
