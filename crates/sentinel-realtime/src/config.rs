//! Runtime configuration for [`WebSocketClient`](crate::WebSocketClient).

use std::time::Duration;

use sentinel_core::config::client::ClientSettings;

use crate::connection::backoff::ReconnectPolicy;

/// Default base delay before the first reconnect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);
/// Default number of reconnect attempts before giving up.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
/// Default ceiling for the backoff delay.
pub const DEFAULT_MAX_RECONNECT_DELAY: Duration = Duration::from_millis(30_000);
/// Default bound on the opening handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(10_000);
/// Default bound on how long `close()` waits for the close event.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_millis(5000);
/// Default maximum inbound frame size.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 65_536;

/// Immutable client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// WebSocket endpoint.
    pub url: String,
    /// Base delay before the first reconnect attempt.
    pub reconnect_delay: Duration,
    /// Reconnect attempts allowed before the client settles in `Disconnected`.
    pub max_reconnect_attempts: u32,
    /// Upper bound for the backoff delay.
    pub max_reconnect_delay: Duration,
    /// Bound on the opening handshake.
    pub handshake_timeout: Duration,
    /// Bound on the wait for the close acknowledgment.
    pub close_timeout: Duration,
    /// Largest inbound frame accepted, in bytes.
    pub max_frame_bytes: usize,
}

impl ClientConfig {
    /// Configuration for `url` with all other values at their defaults.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            max_reconnect_delay: DEFAULT_MAX_RECONNECT_DELAY,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    /// Override the base reconnect delay.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Override the maximum number of reconnect attempts.
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Override the backoff ceiling.
    pub fn with_max_reconnect_delay(mut self, delay: Duration) -> Self {
        self.max_reconnect_delay = delay;
        self
    }

    /// Override the opening handshake timeout.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Override the close acknowledgment timeout.
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Override the inbound frame size limit.
    pub fn with_max_frame_bytes(mut self, bytes: usize) -> Self {
        self.max_frame_bytes = bytes;
        self
    }

    /// The reconnect policy derived from this configuration.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(
            self.reconnect_delay,
            self.max_reconnect_delay,
            self.max_reconnect_attempts,
        )
    }
}

impl From<&ClientSettings> for ClientConfig {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            url: settings.url.clone(),
            reconnect_delay: Duration::from_millis(settings.reconnect_delay_ms),
            max_reconnect_attempts: settings.max_reconnect_attempts,
            max_reconnect_delay: Duration::from_millis(settings.max_reconnect_delay_ms),
            handshake_timeout: Duration::from_millis(settings.handshake_timeout_ms),
            close_timeout: Duration::from_millis(settings.close_timeout_ms),
            max_frame_bytes: settings.max_frame_bytes,
        }
    }
}
