//! Handler set supplied by the UI layer.
//!
//! Every hook is filled with a no-op when the caller does not provide one,
//! so the client never has to check for presence at dispatch time.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;

/// Normal closure.
pub const CLOSE_NORMAL: u16 = 1000;
/// Endpoint going away.
pub const CLOSE_GOING_AWAY: u16 = 1001;
/// Closed without a status code.
pub const CLOSE_NO_STATUS: u16 = 1005;
/// Closed without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Close metadata passed to `on_disconnect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseInfo {
    /// Whether the close handshake completed.
    pub was_clean: bool,
    /// WebSocket close code.
    pub code: u16,
    /// Close reason, possibly empty.
    pub reason: String,
}

impl CloseInfo {
    /// Build close metadata.
    pub fn new(was_clean: bool, code: u16, reason: impl Into<String>) -> Self {
        Self {
            was_clean,
            code,
            reason: reason.into(),
        }
    }

    /// A clean close with code 1000.
    pub fn normal(reason: impl Into<String>) -> Self {
        Self::new(true, CLOSE_NORMAL, reason)
    }

    /// An unclean close with code 1006.
    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self::new(false, CLOSE_ABNORMAL, reason)
    }
}

type ConnectFn = Arc<dyn Fn() + Send + Sync>;
type DisconnectFn = Arc<dyn Fn(&CloseInfo) + Send + Sync>;
type PayloadFn = Arc<dyn Fn(Value) + Send + Sync>;
type ErrorFn = Arc<dyn Fn(&ClientError) + Send + Sync>;

/// Callbacks invoked by the client.
///
/// Handlers run inline with event processing and must not block.
///
/// ```ignore
/// let handlers = HandlerSet::new()
///     .on_connect(|| println!("connected"))
///     .on_test_results(|results| println!("{results}"));
/// ```
#[derive(Clone)]
pub struct HandlerSet {
    connect: ConnectFn,
    disconnect: DisconnectFn,
    test_results: PayloadFn,
    metrics_update: PayloadFn,
    notification: PayloadFn,
    error: ErrorFn,
}

impl HandlerSet {
    /// A handler set where every hook is a no-op.
    pub fn new() -> Self {
        Self {
            connect: Arc::new(|| {}),
            disconnect: Arc::new(|_| {}),
            test_results: Arc::new(|_| {}),
            metrics_update: Arc::new(|_| {}),
            notification: Arc::new(|_| {}),
            error: Arc::new(|_| {}),
        }
    }

    /// Called when the connection opens.
    pub fn on_connect(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.connect = Arc::new(f);
        self
    }

    /// Called when the connection closes.
    pub fn on_disconnect(mut self, f: impl Fn(&CloseInfo) + Send + Sync + 'static) -> Self {
        self.disconnect = Arc::new(f);
        self
    }

    /// Called with the payload of `test_results` frames.
    pub fn on_test_results(mut self, f: impl Fn(Value) + Send + Sync + 'static) -> Self {
        self.test_results = Arc::new(f);
        self
    }

    /// Called with the payload of `metrics-update` frames.
    pub fn on_metrics_update(mut self, f: impl Fn(Value) + Send + Sync + 'static) -> Self {
        self.metrics_update = Arc::new(f);
        self
    }

    /// Called with the payload of `notification` frames.
    pub fn on_notification(mut self, f: impl Fn(Value) + Send + Sync + 'static) -> Self {
        self.notification = Arc::new(f);
        self
    }

    /// Called on transport, decode, and encode failures.
    pub fn on_error(mut self, f: impl Fn(&ClientError) + Send + Sync + 'static) -> Self {
        self.error = Arc::new(f);
        self
    }

    pub(crate) fn connected(&self) {
        (self.connect)()
    }

    pub(crate) fn disconnected(&self, info: &CloseInfo) {
        (self.disconnect)(info)
    }

    pub(crate) fn test_results(&self, payload: Value) {
        (self.test_results)(payload)
    }

    pub(crate) fn metrics_update(&self, payload: Value) {
        (self.metrics_update)(payload)
    }

    pub(crate) fn notification(&self, payload: Value) {
        (self.notification)(payload)
    }

    pub(crate) fn error(&self, err: &ClientError) {
        (self.error)(err)
    }
}

impl Default for HandlerSet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSet").finish_non_exhaustive()
    }
}
