//! Client-side connection states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of the logical connection.
///
/// ```text
/// Disconnected --connect()--> Connecting
/// Connecting   --open-------> Connected
/// Connecting   --failure----> Reconnecting | Disconnected
/// Connected    --close------> Reconnecting | Disconnected
/// Reconnecting --timer------> Connecting
/// (any)        --close()----> Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No transport and no pending reconnect.
    Disconnected,
    /// A transport exists and its opening handshake is in flight.
    Connecting,
    /// The transport is open.
    Connected,
    /// Waiting for the reconnect timer.
    Reconnecting,
    /// Explicitly closed. Terminal.
    Closed,
}

impl ConnectionState {
    /// Whether no further transitions can happen.
    pub fn is_terminal(self) -> bool {
        self == Self::Closed
    }

    /// Label used in logs and status displays.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
