//! Transport contract the client depends on.
//!
//! A [`Connector`] creates [`Transport`]s. Each transport reports its
//! lifecycle through the [`TransportEvents`] it was opened with; the four
//! hooks are the only way a transport talks back to the client.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::handler::CloseInfo;

/// Readiness of a transport, mirroring the WebSocket `readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyState {
    /// Opening handshake in progress.
    Connecting,
    /// Frames can be sent.
    Open,
    /// Close requested, waiting for the peer.
    Closing,
    /// Fully closed.
    Closed,
}

impl ReadyState {
    fn to_u8(self) -> u8 {
        match self {
            Self::Connecting => 0,
            Self::Open => 1,
            Self::Closing => 2,
            Self::Closed => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// A [`ReadyState`] shared between a transport handle and its I/O task.
#[derive(Debug)]
pub struct AtomicReadyState(AtomicU8);

impl AtomicReadyState {
    /// Create with an initial state.
    pub fn new(state: ReadyState) -> Self {
        Self(AtomicU8::new(state.to_u8()))
    }

    /// Current state.
    pub fn load(&self) -> ReadyState {
        ReadyState::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// Overwrite the state.
    pub fn store(&self, state: ReadyState) {
        self.0.store(state.to_u8(), Ordering::SeqCst);
    }

    /// Move from `current` to `new`; returns false if the state was not `current`.
    pub fn transition(&self, current: ReadyState, new: ReadyState) -> bool {
        self.0
            .compare_exchange(
                current.to_u8(),
                new.to_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }
}

/// Lifecycle notifications emitted by a transport.
///
/// For a given transport the order is: `on_open`, zero or more
/// `on_message`, then exactly one `on_close`. `on_error` may appear anywhere
/// before `on_close`. A transport that fails to open reports `on_error`
/// followed by `on_close` without `on_open`.
pub trait TransportEvents: Send + Sync {
    /// The opening handshake completed.
    fn on_open(&self);
    /// A text frame arrived.
    fn on_message(&self, text: String);
    /// The transport is closed; no further events follow.
    fn on_close(&self, info: CloseInfo);
    /// The transport hit an error.
    fn on_error(&self, error: TransportError);
}

/// A duplex, message-oriented connection.
pub trait Transport: Send + Sync {
    /// Queue a text frame. Fails unless the transport is open.
    fn send(&self, text: String) -> Result<(), TransportError>;
    /// Request a close handshake. No-op when already closing or closed.
    fn close(&self, code: u16, reason: &str);
    /// Current readiness.
    fn ready_state(&self) -> ReadyState;
}

/// Factory for transports bound to a URL.
pub trait Connector: Send + Sync {
    /// Start opening a transport to `url`.
    ///
    /// Returning `Err` means the transport could not even be constructed;
    /// no events will be delivered to `events` in that case.
    fn open(
        &self,
        url: &str,
        events: Arc<dyn TransportEvents>,
    ) -> Result<Box<dyn Transport>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_ready_state_transition() {
        let state = AtomicReadyState::new(ReadyState::Connecting);
        assert!(state.transition(ReadyState::Connecting, ReadyState::Open));
        assert!(!state.transition(ReadyState::Connecting, ReadyState::Closing));
        assert_eq!(state.load(), ReadyState::Open);
        state.store(ReadyState::Closed);
        assert_eq!(state.load(), ReadyState::Closed);
    }
}
