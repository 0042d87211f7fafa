//! Connection manager: owns the transport, drives the state machine, and
//! schedules reconnects.
//!
//! The manager runs as a single task. Caller commands, transport lifecycle
//! events, and timer expiries are all processed one at a time, so no two
//! state transitions ever overlap. Every transport is tagged with a
//! generation number; events from a transport that has since been replaced
//! are discarded.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ClientError, TransportError};
use crate::handler::{CLOSE_GOING_AWAY, CLOSE_NORMAL, CloseInfo, HandlerSet};
use crate::message::router::MessageRouter;
use crate::metrics::ClientMetrics;

use super::backoff::ReconnectPolicy;
use super::gate::OutboundGate;
use super::state::ConnectionState;
use super::transport::{Connector, ReadyState, Transport, TransportEvents};

/// Requests from the client handle.
pub(crate) enum Command {
    /// Open a fresh transport, cycling any existing one.
    Connect,
    /// Transmit one message.
    Send {
        kind: String,
        payload: Result<Option<Value>, ClientError>,
        reply: oneshot::Sender<bool>,
    },
    /// Close permanently.
    Close {
        code: u16,
        reason: String,
        reply: oneshot::Sender<()>,
    },
    /// Reply once everything queued before it has been processed.
    Flush { reply: oneshot::Sender<()> },
    /// The client handle was dropped.
    Release,
}

/// Notifications from a transport.
pub(crate) enum LifecycleEvent {
    Open,
    Message(String),
    Close(CloseInfo),
    Error(TransportError),
}

/// Everything the manager task consumes, in arrival order.
pub(crate) enum Input {
    Command(Command),
    Transport {
        generation: u64,
        event: LifecycleEvent,
    },
}

/// Connection status readable without a round trip through the manager.
#[derive(Debug)]
pub struct ConnectionStatus {
    connected: AtomicBool,
    attempts: AtomicU32,
    state: watch::Sender<ConnectionState>,
}

impl ConnectionStatus {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            connected: AtomicBool::new(false),
            attempts: AtomicU32::new(0),
            state,
        }
    }

    /// True iff the current transport is open.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Reconnect attempts since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }
}

/// Feeds one transport's hooks into the manager's inbox.
struct EventForwarder {
    generation: u64,
    inbox: mpsc::UnboundedSender<Input>,
}

impl EventForwarder {
    fn forward(&self, event: LifecycleEvent) {
        // The manager may already be gone; late events are irrelevant then.
        let _ = self.inbox.send(Input::Transport {
            generation: self.generation,
            event,
        });
    }
}

impl TransportEvents for EventForwarder {
    fn on_open(&self) {
        self.forward(LifecycleEvent::Open);
    }

    fn on_message(&self, text: String) {
        self.forward(LifecycleEvent::Message(text));
    }

    fn on_close(&self, info: CloseInfo) {
        self.forward(LifecycleEvent::Close(info));
    }

    fn on_error(&self, error: TransportError) {
        self.forward(LifecycleEvent::Error(error));
    }
}

struct ActiveTransport {
    generation: u64,
    handle: Box<dyn Transport>,
}

struct ReconnectTimer {
    deadline: Instant,
    attempt: u32,
}

/// An explicit close waiting for the transport's close event.
struct PendingClose {
    transport: ActiveTransport,
    deadline: Instant,
    was_open: bool,
    waiters: Vec<oneshot::Sender<()>>,
}

/// Owns the transport and all mutable connection state.
pub(crate) struct ConnectionManager {
    client_id: Uuid,
    url: String,
    policy: ReconnectPolicy,
    close_timeout: Duration,
    handlers: HandlerSet,
    connector: Arc<dyn Connector>,
    router: MessageRouter,
    metrics: Arc<ClientMetrics>,
    status: Arc<ConnectionStatus>,
    inbox: mpsc::UnboundedSender<Input>,
    state: ConnectionState,
    generation: u64,
    attempts: u32,
    transport: Option<ActiveTransport>,
    reconnect_timer: Option<ReconnectTimer>,
    pending_close: Option<PendingClose>,
}

impl ConnectionManager {
    pub(crate) fn new(
        client_id: Uuid,
        config: &ClientConfig,
        handlers: HandlerSet,
        connector: Arc<dyn Connector>,
        metrics: Arc<ClientMetrics>,
        status: Arc<ConnectionStatus>,
        inbox: mpsc::UnboundedSender<Input>,
    ) -> Self {
        Self {
            client_id,
            url: config.url.clone(),
            policy: config.reconnect_policy(),
            close_timeout: config.close_timeout,
            handlers,
            connector,
            router: MessageRouter::new(config.max_frame_bytes),
            metrics,
            status,
            inbox,
            state: ConnectionState::Disconnected,
            generation: 0,
            attempts: 0,
            transport: None,
            reconnect_timer: None,
            pending_close: None,
        }
    }

    /// Process inputs until the client is closed and cleanup is complete.
    pub(crate) async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Input>) {
        while !self.is_finished() {
            let reconnect_at = self.reconnect_timer.as_ref().map(|t| t.deadline);
            let close_by = self.pending_close.as_ref().map(|p| p.deadline);

            tokio::select! {
                biased;
                _ = wait_until(close_by) => self.close_timed_out(),
                _ = wait_until(reconnect_at) => self.reconnect_timer_fired(),
                input = inbox.recv() => match input {
                    Some(input) => self.handle(input),
                    None => break,
                },
            }
        }

        debug!(client_id = %self.client_id, "Connection manager stopped");
    }

    fn is_finished(&self) -> bool {
        self.state.is_terminal() && self.pending_close.is_none()
    }

    fn handle(&mut self, input: Input) {
        match input {
            Input::Command(Command::Connect) => self.connect_requested(),
            Input::Command(Command::Send {
                kind,
                payload,
                reply,
            }) => {
                let sent = self.send(&kind, payload);
                let _ = reply.send(sent);
            }
            Input::Command(Command::Close {
                code,
                reason,
                reply,
            }) => self.begin_close(code, &reason, Some(reply)),
            Input::Command(Command::Flush { reply }) => {
                let _ = reply.send(());
            }
            Input::Command(Command::Release) => {
                self.begin_close(CLOSE_GOING_AWAY, "client dropped", None)
            }
            Input::Transport { generation, event } => self.transport_event(generation, event),
        }
    }

    /// A caller-initiated connect gets a fresh reconnect budget.
    fn connect_requested(&mut self) {
        if self.state.is_terminal() {
            warn!(client_id = %self.client_id, "Ignoring connect request: client is closed");
            return;
        }
        self.set_attempts(0);
        self.open_transport();
    }

    /// Replace any existing transport with a new one.
    pub(crate) fn open_transport(&mut self) {
        self.cancel_reconnect_timer();
        self.retire_transport();

        self.generation += 1;
        let generation = self.generation;
        let events: Arc<dyn TransportEvents> = Arc::new(EventForwarder {
            generation,
            inbox: self.inbox.clone(),
        });

        self.set_state(ConnectionState::Connecting);
        info!(
            client_id = %self.client_id,
            url = %self.url,
            generation,
            "Connecting to WebSocket server"
        );

        match self.connector.open(&self.url, events) {
            Ok(handle) => self.transport = Some(ActiveTransport { generation, handle }),
            Err(err) => {
                error!(client_id = %self.client_id, url = %self.url, error = %err, "Failed to create WebSocket");
                self.handlers.error(&ClientError::Transport(err));
                self.schedule_reconnect();
            }
        }
    }

    /// Close the current transport as part of a connection cycle.
    fn retire_transport(&mut self) {
        let Some(active) = self.transport.take() else {
            return;
        };

        let was_open = self.state == ConnectionState::Connected;
        active.handle.close(CLOSE_NORMAL, "reconnecting");
        self.set_connected(false);

        if was_open {
            info!(client_id = %self.client_id, generation = active.generation, "Cycling WebSocket connection");
            self.handlers
                .disconnected(&CloseInfo::normal("client reconnecting"));
        }
    }

    fn transport_event(&mut self, generation: u64, event: LifecycleEvent) {
        let is_current = self
            .transport
            .as_ref()
            .is_some_and(|t| t.generation == generation);
        let is_closing = self
            .pending_close
            .as_ref()
            .is_some_and(|p| p.transport.generation == generation);

        if !is_current && !is_closing {
            debug!(
                client_id = %self.client_id,
                generation,
                current = self.generation,
                "Ignoring event from superseded transport"
            );
            return;
        }

        match event {
            LifecycleEvent::Open if is_current => self.opened(),
            LifecycleEvent::Open => {
                debug!(client_id = %self.client_id, generation, "Transport opened after close was requested");
            }
            LifecycleEvent::Message(text) => {
                let outcome = self.router.route(&text, &self.handlers);
                self.metrics.frame_routed(&outcome);
            }
            LifecycleEvent::Error(err) => {
                error!(client_id = %self.client_id, generation, error = %err, "WebSocket error");
                self.handlers.error(&ClientError::Transport(err));
            }
            LifecycleEvent::Close(info) if is_closing => self.finish_close(info),
            LifecycleEvent::Close(info) => self.closed(info),
        }
    }

    fn opened(&mut self) {
        self.set_connected(true);
        self.set_attempts(0);
        self.set_state(ConnectionState::Connected);
        self.metrics.connection_opened();
        info!(client_id = %self.client_id, url = %self.url, "WebSocket connected");
        self.handlers.connected();
    }

    /// The current transport closed without being asked to.
    fn closed(&mut self, info: CloseInfo) {
        self.transport = None;
        self.set_connected(false);
        info!(
            client_id = %self.client_id,
            code = info.code,
            clean = info.was_clean,
            reason = %info.reason,
            "WebSocket disconnected"
        );
        self.handlers.disconnected(&info);
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        self.cancel_reconnect_timer();

        if !self.policy.allows(self.attempts) {
            warn!(
                client_id = %self.client_id,
                attempts = self.attempts,
                max = self.policy.max_attempts(),
                "Max reconnection attempts reached"
            );
            self.set_state(ConnectionState::Disconnected);
            return;
        }

        let attempt = self.attempts + 1;
        self.set_attempts(attempt);
        let delay = self.policy.delay_for(attempt);

        info!(
            client_id = %self.client_id,
            attempt,
            max = self.policy.max_attempts(),
            delay_ms = delay.as_millis() as u64,
            "Attempting to reconnect"
        );

        self.reconnect_timer = Some(ReconnectTimer {
            deadline: Instant::now() + delay,
            attempt,
        });
        self.metrics.reconnect_scheduled();
        self.set_state(ConnectionState::Reconnecting);
    }

    fn cancel_reconnect_timer(&mut self) {
        if let Some(timer) = self.reconnect_timer.take() {
            debug!(client_id = %self.client_id, attempt = timer.attempt, "Reconnect timer cancelled");
        }
    }

    fn reconnect_timer_fired(&mut self) {
        if let Some(timer) = self.reconnect_timer.take() {
            debug!(client_id = %self.client_id, attempt = timer.attempt, "Reconnect timer fired");
            self.open_transport();
        }
    }

    fn send(&mut self, kind: &str, payload: Result<Option<Value>, ClientError>) -> bool {
        let transport = match (&self.transport, self.state) {
            (Some(active), ConnectionState::Connected)
                if active.handle.ready_state() == ReadyState::Open =>
            {
                Some(&*active.handle)
            }
            _ => None,
        };
        OutboundGate::new(transport, &self.handlers, &self.metrics)
            .send(kind, payload)
            .is_sent()
    }

    fn begin_close(&mut self, code: u16, reason: &str, reply: Option<oneshot::Sender<()>>) {
        if self.state.is_terminal() {
            if let Some(reply) = reply {
                let _ = reply.send(());
            }
            return;
        }

        self.cancel_reconnect_timer();
        let was_open = self.state == ConnectionState::Connected;
        self.set_connected(false);
        self.set_state(ConnectionState::Closed);

        match self.transport.take() {
            Some(active) => {
                info!(client_id = %self.client_id, code, reason, "Closing WebSocket connection");
                // An already-closed transport still has its close event queued.
                if active.handle.ready_state() != ReadyState::Closed {
                    active.handle.close(code, reason);
                }
                self.pending_close = Some(PendingClose {
                    transport: active,
                    deadline: Instant::now() + self.close_timeout,
                    was_open,
                    waiters: reply.into_iter().collect(),
                });
            }
            None => {
                info!(client_id = %self.client_id, "WebSocket client closed");
                if let Some(reply) = reply {
                    let _ = reply.send(());
                }
            }
        }
    }

    fn finish_close(&mut self, info: CloseInfo) {
        let Some(pending) = self.pending_close.take() else {
            return;
        };

        info!(
            client_id = %self.client_id,
            code = info.code,
            clean = info.was_clean,
            "WebSocket closed"
        );
        self.handlers.disconnected(&info);
        release_waiters(pending.waiters);
    }

    fn close_timed_out(&mut self) {
        let Some(pending) = self.pending_close.take() else {
            return;
        };

        warn!(
            client_id = %self.client_id,
            timeout_ms = self.close_timeout.as_millis() as u64,
            "Timed out waiting for WebSocket close acknowledgment; cleaning up"
        );
        if pending.was_open {
            self.handlers
                .disconnected(&CloseInfo::abnormal("close acknowledgment timed out"));
        }
        drop(pending.transport);
        release_waiters(pending.waiters);
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            debug!(client_id = %self.client_id, from = %self.state, to = %state, "Connection state changed");
            self.state = state;
            self.status.state.send_replace(state);
        }
    }

    fn set_connected(&self, connected: bool) {
        self.status.connected.store(connected, Ordering::SeqCst);
    }

    fn set_attempts(&mut self, attempts: u32) {
        self.attempts = attempts;
        self.status.attempts.store(attempts, Ordering::SeqCst);
    }
}

fn release_waiters(waiters: Vec<oneshot::Sender<()>>) {
    for waiter in waiters {
        let _ = waiter.send(());
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    struct Unreachable;

    impl Connector for Unreachable {
        fn open(
            &self,
            url: &str,
            _events: Arc<dyn TransportEvents>,
        ) -> Result<Box<dyn Transport>, TransportError> {
            Err(TransportError::Create {
                url: url.to_string(),
                reason: "unreachable".into(),
            })
        }
    }

    fn unreachable_manager(max_attempts: u32) -> (ConnectionManager, Arc<ConnectionStatus>) {
        let config =
            ClientConfig::new("ws://127.0.0.1:1/ws").with_max_reconnect_attempts(max_attempts);
        let status = Arc::new(ConnectionStatus::new());
        let (inbox, _rx) = mpsc::unbounded_channel();
        let manager = ConnectionManager::new(
            Uuid::new_v4(),
            &config,
            HandlerSet::new(),
            Arc::new(Unreachable),
            Arc::new(ClientMetrics::new()),
            status.clone(),
            inbox,
        );
        (manager, status)
    }

    #[test]
    #[traced_test]
    fn test_exhausted_attempts_warn_and_settle() {
        let (mut manager, status) = unreachable_manager(1);

        manager.open_transport();
        assert_eq!(status.state(), ConnectionState::Reconnecting);
        assert!(!logs_contain("Max reconnection attempts reached"));

        manager.reconnect_timer_fired();

        assert_eq!(status.state(), ConnectionState::Disconnected);
        assert_eq!(status.reconnect_attempts(), 1);
        assert!(manager.reconnect_timer.is_none());
        assert!(logs_contain("Max reconnection attempts reached"));
    }

    #[test]
    fn test_close_while_reconnecting_is_immediate() {
        let (mut manager, status) = unreachable_manager(3);
        manager.open_transport();

        let (reply, mut rx) = oneshot::channel();
        manager.begin_close(CLOSE_NORMAL, "", Some(reply));

        assert!(rx.try_recv().is_ok());
        assert!(manager.reconnect_timer.is_none());
        assert!(manager.is_finished());
        assert_eq!(status.state(), ConnectionState::Closed);
    }
}
