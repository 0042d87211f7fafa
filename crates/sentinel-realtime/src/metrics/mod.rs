//! Client-side counters.

use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::RouteOutcome;

/// Counters updated by the connection manager.
#[derive(Debug, Default)]
pub struct ClientMetrics {
    frames_received: AtomicU64,
    frames_dispatched: AtomicU64,
    frames_dropped: AtomicU64,
    decode_errors: AtomicU64,
    messages_sent: AtomicU64,
    send_failures: AtomicU64,
    sends_rejected: AtomicU64,
    connections_opened: AtomicU64,
    reconnects_scheduled: AtomicU64,
    last_connected_at: RwLock<Option<DateTime<Utc>>>,
}

impl ClientMetrics {
    /// Create zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record how an inbound frame was handled.
    pub fn frame_routed(&self, outcome: &RouteOutcome) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            RouteOutcome::Dispatched(_) | RouteOutcome::Heartbeat => &self.frames_dispatched,
            RouteOutcome::MissingType | RouteOutcome::Unknown(_) => &self.frames_dropped,
            RouteOutcome::Rejected(_) => &self.decode_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// A frame was handed to the transport.
    pub fn message_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Encoding or transmission failed.
    pub fn send_failed(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// A send was refused because the client was not connected.
    pub fn send_rejected(&self) {
        self.sends_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// A transport reached the open state.
    pub fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut at) = self.last_connected_at.write() {
            *at = Some(Utc::now());
        }
    }

    /// A reconnect timer was armed.
    pub fn reconnect_scheduled(&self) {
        self.reconnects_scheduled.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_dispatched: self.frames_dispatched.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            sends_rejected: self.sends_rejected.load(Ordering::Relaxed),
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            reconnects_scheduled: self.reconnects_scheduled.load(Ordering::Relaxed),
            last_connected_at: self.last_connected_at.read().ok().and_then(|at| *at),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Inbound frames seen
    pub frames_received: u64,
    /// Frames delivered to a handler (including heartbeats)
    pub frames_dispatched: u64,
    /// Frames dropped for a missing or unknown type
    pub frames_dropped: u64,
    /// Frames that failed validation or decoding
    pub decode_errors: u64,
    /// Frames handed to the transport
    pub messages_sent: u64,
    /// Sends that failed to encode or transmit
    pub send_failures: u64,
    /// Sends refused while not connected
    pub sends_rejected: u64,
    /// Transports that reached the open state
    pub connections_opened: u64,
    /// Reconnect timers armed
    pub reconnects_scheduled: u64,
    /// When the most recent connection opened
    pub last_connected_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::message::MessageKind;

    #[test]
    fn test_frame_outcomes_are_bucketed() {
        let metrics = ClientMetrics::new();
        metrics.frame_routed(&RouteOutcome::Dispatched(MessageKind::Notification));
        metrics.frame_routed(&RouteOutcome::Heartbeat);
        metrics.frame_routed(&RouteOutcome::Unknown("x".into()));
        metrics.frame_routed(&RouteOutcome::Rejected(ClientError::EmptyFrame));

        let snap = metrics.snapshot();
        assert_eq!(snap.frames_received, 4);
        assert_eq!(snap.frames_dispatched, 2);
        assert_eq!(snap.frames_dropped, 1);
        assert_eq!(snap.decode_errors, 1);
        assert!(snap.last_connected_at.is_none());
    }
}
