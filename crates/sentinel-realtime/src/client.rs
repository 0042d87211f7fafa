//! Public client handle.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::warn;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::connection::manager::{Command, ConnectionManager, ConnectionStatus, Input};
use crate::connection::state::ConnectionState;
use crate::connection::transport::Connector;
use crate::connection::websocket::TungsteniteConnector;
use crate::error::ClientError;
use crate::handler::{CLOSE_NORMAL, HandlerSet};
use crate::message::serializer::to_payload;
use crate::metrics::{ClientMetrics, MetricsSnapshot};

/// Resilient WebSocket client.
///
/// Construction immediately starts the first connection attempt. The
/// connection is re-established with exponential backoff after unexpected
/// loss, up to the configured number of attempts. [`close`](Self::close)
/// ends the client for good; dropping the handle does the same without
/// waiting.
///
/// # Panics
///
/// The constructors spawn a task and panic when called outside a Tokio
/// runtime.
#[derive(Debug)]
pub struct WebSocketClient {
    id: Uuid,
    url: String,
    inbox: mpsc::UnboundedSender<Input>,
    status: Arc<ConnectionStatus>,
    metrics: Arc<ClientMetrics>,
}

impl WebSocketClient {
    /// Create a client using the `tokio-tungstenite` transport.
    pub fn new(config: ClientConfig, handlers: HandlerSet) -> Self {
        let connector = TungsteniteConnector::new(config.handshake_timeout);
        Self::with_connector(config, handlers, Arc::new(connector))
    }

    /// Create a client over a custom transport.
    pub fn with_connector(
        config: ClientConfig,
        handlers: HandlerSet,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let id = Uuid::new_v4();
        let (inbox, inbox_rx) = mpsc::unbounded_channel();
        let status = Arc::new(ConnectionStatus::new());
        let metrics = Arc::new(ClientMetrics::new());

        let mut manager = ConnectionManager::new(
            id,
            &config,
            handlers,
            connector,
            metrics.clone(),
            status.clone(),
            inbox.clone(),
        );
        manager.open_transport();
        tokio::spawn(manager.run(inbox_rx));

        Self {
            id,
            url: config.url,
            inbox,
            status,
            metrics,
        }
    }

    /// Open a fresh connection.
    ///
    /// Closes the current transport first if there is one, and resets the
    /// reconnect budget. Ignored once the client is closed.
    pub fn connect(&self) {
        if self.command(Command::Connect).is_err() {
            warn!(client_id = %self.id, "Ignoring connect request: client is closed");
        }
    }

    /// Send `{type, payload}`. Returns whether a frame was transmitted.
    ///
    /// Returns `false` without error when not connected.
    pub async fn send(&self, kind: &str, payload: Option<Value>) -> bool {
        self.send_payload(kind, Ok(payload)).await
    }

    /// Send any serializable payload.
    ///
    /// A payload that cannot be represented as JSON is reported to
    /// `on_error` and nothing is sent.
    pub async fn send_with<T: Serialize + ?Sized>(&self, kind: &str, payload: &T) -> bool {
        self.send_payload(kind, to_payload(payload).map(Some)).await
    }

    async fn send_payload(&self, kind: &str, payload: Result<Option<Value>, ClientError>) -> bool {
        let (reply, rx) = oneshot::channel();
        let command = Command::Send {
            kind: kind.to_string(),
            payload,
            reply,
        };
        if self.command(command).is_err() {
            warn!(client_id = %self.id, message_type = %kind, "Cannot send message - WebSocket not connected");
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Close the connection permanently with `code` and `reason`.
    ///
    /// Cancels any pending reconnect and waits (bounded by the configured
    /// close timeout) for the transport to confirm. Safe to call repeatedly.
    pub async fn close(&self, code: u16, reason: &str) {
        let (reply, rx) = oneshot::channel();
        let command = Command::Close {
            code,
            reason: reason.to_string(),
            reply,
        };
        if self.command(command).is_ok() {
            let _ = rx.await;
        }
    }

    /// Close with code 1000 and no reason.
    pub async fn shutdown(&self) {
        self.close(CLOSE_NORMAL, "").await
    }

    /// Wait until every event and command queued before this call has been
    /// processed.
    pub async fn flush(&self) {
        let (reply, rx) = oneshot::channel();
        if self.command(Command::Flush { reply }).is_ok() {
            let _ = rx.await;
        }
    }

    /// True iff the current transport is open.
    pub fn is_connected(&self) -> bool {
        self.status.is_connected()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.status.state()
    }

    /// Reconnect attempts since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        self.status.reconnect_attempts()
    }

    /// Receiver notified on every state change.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.status.subscribe()
    }

    /// Snapshot of the client counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Identifier used in this client's log records.
    pub fn id(&self) -> Uuid {
        self.id
    }

    fn command(&self, command: Command) -> Result<(), ()> {
        self.inbox.send(Input::Command(command)).map_err(|_| ())
    }
}

impl Drop for WebSocketClient {
    fn drop(&mut self) {
        let _ = self.inbox.send(Input::Command(Command::Release));
    }
}
