//! Outbound gate: encodes and transmits application messages only while
//! connected.

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::ClientError;
use crate::handler::HandlerSet;
use crate::message::envelope::Envelope;
use crate::message::serializer::encode_envelope;
use crate::metrics::ClientMetrics;

use super::transport::Transport;

/// Result of a send request.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Exactly one frame was handed to the transport.
    Sent,
    /// Refused: the client is not connected. Expected, not an error.
    NotConnected,
    /// Refused: the type tag was empty.
    EmptyType,
    /// Encoding or transmission failed; `on_error` was invoked.
    Failed(ClientError),
}

impl SendOutcome {
    /// Whether a frame went out.
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// Gate over the current transport.
pub struct OutboundGate<'a> {
    transport: Option<&'a dyn Transport>,
    handlers: &'a HandlerSet,
    metrics: &'a ClientMetrics,
}

impl<'a> OutboundGate<'a> {
    /// `transport` is `Some` only while the client is connected.
    pub fn new(
        transport: Option<&'a dyn Transport>,
        handlers: &'a HandlerSet,
        metrics: &'a ClientMetrics,
    ) -> Self {
        Self {
            transport,
            handlers,
            metrics,
        }
    }

    /// Encode `{type, payload}` and transmit it.
    ///
    /// `payload` carries the result of converting the caller's value, so a
    /// conversion failure is reported through the same path as a transport
    /// failure.
    pub fn send(&self, kind: &str, payload: Result<Option<Value>, ClientError>) -> SendOutcome {
        if kind.is_empty() {
            warn!("Refusing to send message with an empty type");
            return SendOutcome::EmptyType;
        }

        let Some(transport) = self.transport else {
            warn!(message_type = %kind, "Cannot send message - WebSocket not connected");
            self.metrics.send_rejected();
            return SendOutcome::NotConnected;
        };

        let encoded = payload
            .map(|payload| Envelope::new(kind, payload))
            .and_then(|envelope| encode_envelope(&envelope));

        let result = encoded.and_then(|text| transport.send(text).map_err(ClientError::from));

        match result {
            Ok(()) => {
                debug!(message_type = %kind, "WebSocket message sent");
                self.metrics.message_sent();
                SendOutcome::Sent
            }
            Err(err) => {
                error!(message_type = %kind, error = %err, "Error sending WebSocket message");
                self.metrics.send_failed();
                self.handlers.error(&err);
                SendOutcome::Failed(err)
            }
        }
    }
}
