//! Shared test helpers for client integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use sentinel_realtime::connection::transport::{Connector, ReadyState, Transport, TransportEvents};
use sentinel_realtime::{CloseInfo, HandlerSet, TransportError};

/// One transport created by [`MockConnector`], driven by the test.
pub struct MockSocket {
    pub url: String,
    events: Arc<dyn TransportEvents>,
    state: Mutex<ReadyState>,
    sent: Mutex<Vec<String>>,
    closes: Mutex<Vec<(u16, String)>>,
    fail_send: AtomicBool,
    ack_close: bool,
}

impl MockSocket {
    /// Complete the opening handshake.
    pub fn open(&self) {
        *self.state.lock().unwrap() = ReadyState::Open;
        self.events.on_open();
    }

    /// Deliver a text frame from the server.
    pub fn message(&self, text: &str) {
        self.events.on_message(text.to_string());
    }

    /// Close from the server side.
    pub fn server_close(&self, code: u16, reason: &str) {
        *self.state.lock().unwrap() = ReadyState::Closed;
        self.events.on_close(CloseInfo::new(true, code, reason));
    }

    /// Fail the connection the way a refused handshake does.
    pub fn fail(&self) {
        *self.state.lock().unwrap() = ReadyState::Closed;
        self.events
            .on_error(TransportError::Handshake("connection refused".into()));
        self.events.on_close(CloseInfo::abnormal("connection refused"));
    }

    /// Change the ready state without emitting any event.
    pub fn set_ready_state(&self, state: ReadyState) {
        *self.state.lock().unwrap() = state;
    }

    /// Emit the close event alone, as a socket task does after marking
    /// itself closed.
    pub fn emit_close(&self, code: u16, reason: &str) {
        self.events.on_close(CloseInfo::new(true, code, reason));
    }

    /// Make every subsequent send fail.
    pub fn break_pipe(&self) {
        self.fail_send.store(true, Ordering::SeqCst);
    }

    /// Frames written by the client.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Close requests issued by the client.
    pub fn closes(&self) -> Vec<(u16, String)> {
        self.closes.lock().unwrap().clone()
    }

    pub fn ready_state(&self) -> ReadyState {
        *self.state.lock().unwrap()
    }
}

struct MockTransport(Arc<MockSocket>);

impl Transport for MockTransport {
    fn send(&self, text: String) -> Result<(), TransportError> {
        let socket = &self.0;
        if *socket.state.lock().unwrap() != ReadyState::Open {
            return Err(TransportError::NotOpen);
        }
        if socket.fail_send.load(Ordering::SeqCst) {
            return Err(TransportError::Send("broken pipe".into()));
        }
        socket.sent.lock().unwrap().push(text);
        Ok(())
    }

    fn close(&self, code: u16, reason: &str) {
        let socket = &self.0;
        {
            let mut state = socket.state.lock().unwrap();
            if matches!(*state, ReadyState::Closing | ReadyState::Closed) {
                return;
            }
            *state = if socket.ack_close {
                ReadyState::Closed
            } else {
                ReadyState::Closing
            };
        }
        socket.closes.lock().unwrap().push((code, reason.to_string()));
        if socket.ack_close {
            socket.events.on_close(CloseInfo::new(true, code, reason));
        }
    }

    fn ready_state(&self) -> ReadyState {
        self.0.ready_state()
    }
}

/// Connector that records every transport it creates.
#[derive(Default)]
pub struct MockConnector {
    sockets: Mutex<Vec<Arc<MockSocket>>>,
    refuse: AtomicBool,
    ignore_close: AtomicBool,
}

impl MockConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail transport construction from now on.
    pub fn refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Sockets created from now on never acknowledge a close.
    pub fn ignore_close(&self) {
        self.ignore_close.store(true, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.sockets.lock().unwrap().len()
    }

    pub fn socket(&self, index: usize) -> Arc<MockSocket> {
        self.sockets.lock().unwrap()[index].clone()
    }

    pub fn latest(&self) -> Arc<MockSocket> {
        let sockets = self.sockets.lock().unwrap();
        sockets.last().cloned().expect("no socket opened")
    }
}

impl Connector for MockConnector {
    fn open(
        &self,
        url: &str,
        events: Arc<dyn TransportEvents>,
    ) -> Result<Box<dyn Transport>, TransportError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(TransportError::Create {
                url: url.to_string(),
                reason: "refused by test".into(),
            });
        }

        let socket = Arc::new(MockSocket {
            url: url.to_string(),
            events,
            state: Mutex::new(ReadyState::Connecting),
            sent: Mutex::new(Vec::new()),
            closes: Mutex::new(Vec::new()),
            fail_send: AtomicBool::new(false),
            ack_close: !self.ignore_close.load(Ordering::SeqCst),
        });
        self.sockets.lock().unwrap().push(socket.clone());
        Ok(Box::new(MockTransport(socket)))
    }
}

/// A handler invocation seen by [`Recorder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    Connected,
    Disconnected(CloseInfo),
    TestResults(Value),
    MetricsUpdate(Value),
    Notification(Value),
    Error(String),
}

/// Records every handler invocation in order.
#[derive(Clone, Default)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<Observed>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handlers(&self) -> HandlerSet {
        let (a, b, c, d, e, f) = (
            self.seen.clone(),
            self.seen.clone(),
            self.seen.clone(),
            self.seen.clone(),
            self.seen.clone(),
            self.seen.clone(),
        );
        HandlerSet::new()
            .on_connect(move || a.lock().unwrap().push(Observed::Connected))
            .on_disconnect(move |info| b.lock().unwrap().push(Observed::Disconnected(info.clone())))
            .on_test_results(move |p| c.lock().unwrap().push(Observed::TestResults(p)))
            .on_metrics_update(move |p| d.lock().unwrap().push(Observed::MetricsUpdate(p)))
            .on_notification(move |p| e.lock().unwrap().push(Observed::Notification(p)))
            .on_error(move |err| f.lock().unwrap().push(Observed::Error(err.to_string())))
    }

    pub fn seen(&self) -> Vec<Observed> {
        self.seen.lock().unwrap().clone()
    }

    pub fn count(&self, matcher: impl Fn(&Observed) -> bool) -> usize {
        self.seen.lock().unwrap().iter().filter(|o| matcher(o)).count()
    }

    pub fn errors(&self) -> usize {
        self.count(|o| matches!(o, Observed::Error(_)))
    }
}
