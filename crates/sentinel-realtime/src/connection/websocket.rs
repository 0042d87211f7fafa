//! `tokio-tungstenite` implementation of the transport contract.
//!
//! Each transport owns one background task that performs the opening
//! handshake, then multiplexes queued outbound frames with inbound frames
//! until the socket ends.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::config::DEFAULT_HANDSHAKE_TIMEOUT;
use crate::error::TransportError;
use crate::handler::{CLOSE_NO_STATUS, CloseInfo};

use super::transport::{AtomicReadyState, Connector, ReadyState, Transport, TransportEvents};

/// Opens plain `ws://` connections with `tokio-tungstenite`.
///
/// Must be used from within a Tokio runtime. A handshake that does not
/// complete within the configured timeout is reported as a failed open.
#[derive(Debug, Clone, Copy)]
pub struct TungsteniteConnector {
    handshake_timeout: Duration,
}

impl TungsteniteConnector {
    /// Connector that abandons handshakes after `handshake_timeout`.
    pub fn new(handshake_timeout: Duration) -> Self {
        Self { handshake_timeout }
    }
}

impl Default for TungsteniteConnector {
    fn default() -> Self {
        Self::new(DEFAULT_HANDSHAKE_TIMEOUT)
    }
}

impl Connector for TungsteniteConnector {
    fn open(
        &self,
        url: &str,
        events: Arc<dyn TransportEvents>,
    ) -> Result<Box<dyn Transport>, TransportError> {
        let request = url
            .into_client_request()
            .map_err(|e| TransportError::Create {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| TransportError::Create {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let state = Arc::new(AtomicReadyState::new(ReadyState::Connecting));

        runtime.spawn(run_socket(
            request,
            self.handshake_timeout,
            outgoing_rx,
            state.clone(),
            events,
        ));

        Ok(Box::new(TungsteniteTransport {
            outgoing: outgoing_tx,
            state,
        }))
    }
}

/// Frames queued for the socket task.
#[derive(Debug)]
enum Outgoing {
    Text(String),
    Close { code: u16, reason: String },
}

/// Handle to a socket task.
#[derive(Debug)]
struct TungsteniteTransport {
    outgoing: mpsc::UnboundedSender<Outgoing>,
    state: Arc<AtomicReadyState>,
}

impl Transport for TungsteniteTransport {
    fn send(&self, text: String) -> Result<(), TransportError> {
        if self.state.load() != ReadyState::Open {
            return Err(TransportError::NotOpen);
        }
        self.outgoing
            .send(Outgoing::Text(text))
            .map_err(|_| TransportError::Send("socket task has ended".to_string()))
    }

    fn close(&self, code: u16, reason: &str) {
        let requested = self.state.transition(ReadyState::Open, ReadyState::Closing)
            || self
                .state
                .transition(ReadyState::Connecting, ReadyState::Closing);
        if requested {
            let _ = self.outgoing.send(Outgoing::Close {
                code,
                reason: reason.to_string(),
            });
        }
    }

    fn ready_state(&self) -> ReadyState {
        self.state.load()
    }
}

async fn run_socket(
    request: Request,
    handshake_timeout: Duration,
    outgoing: mpsc::UnboundedReceiver<Outgoing>,
    state: Arc<AtomicReadyState>,
    events: Arc<dyn TransportEvents>,
) {
    let uri = request.uri().to_string();

    let handshake = tokio::time::timeout(handshake_timeout, connect_async(request)).await;
    let (error, reason) = match handshake {
        Ok(Ok((socket, _response))) => {
            drive_socket(socket, uri, outgoing, state, events).await;
            return;
        }
        Ok(Err(e)) => (e.to_string(), "connection failed"),
        Err(_) => (
            format!("no response within {} ms", handshake_timeout.as_millis()),
            "handshake timed out",
        ),
    };

    debug!(url = %uri, error = %error, "WebSocket handshake failed");
    state.store(ReadyState::Closed);
    events.on_error(TransportError::Handshake(error));
    events.on_close(CloseInfo::abnormal(reason));
}

async fn drive_socket(
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    uri: String,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    state: Arc<AtomicReadyState>,
    events: Arc<dyn TransportEvents>,
) {
    debug!(url = %uri, "WebSocket handshake complete");

    // A close requested during the handshake stays queued; skip `on_open`.
    if state.transition(ReadyState::Connecting, ReadyState::Open) {
        events.on_open();
    }

    let (mut sink, mut stream) = socket.split();
    let mut close_info: Option<CloseInfo> = None;

    loop {
        tokio::select! {
            queued = outgoing.recv() => match queued {
                Some(Outgoing::Text(text)) => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        events.on_error(TransportError::Send(e.to_string()));
                        break;
                    }
                }
                Some(Outgoing::Close { code, reason }) => {
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.into(),
                    };
                    if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                        debug!(url = %uri, error = %e, "Close frame could not be written");
                        break;
                    }
                }
                None => {
                    // Handle dropped; nobody is listening any more.
                    let _ = sink.send(Message::Close(None)).await;
                    state.store(ReadyState::Closed);
                    return;
                }
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => events.on_message(text.as_str().to_owned()),
                Some(Ok(Message::Binary(data))) => {
                    warn!(url = %uri, bytes = data.len(), "Dropping binary WebSocket frame");
                }
                Some(Ok(Message::Close(frame))) => {
                    state.store(ReadyState::Closing);
                    close_info = Some(match frame {
                        Some(frame) => {
                            CloseInfo::new(true, u16::from(frame.code), frame.reason.as_str())
                        }
                        None => CloseInfo::new(true, CLOSE_NO_STATUS, ""),
                    });
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    events.on_error(TransportError::Protocol(e.to_string()));
                    break;
                }
                None => break,
            },
        }
    }

    state.store(ReadyState::Closed);
    events.on_close(close_info.unwrap_or_else(|| CloseInfo::abnormal("connection lost")));
}
