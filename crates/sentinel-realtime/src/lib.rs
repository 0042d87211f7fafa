//! # sentinel-realtime
//!
//! Live-update WebSocket client for the Sentinel test dashboard. Provides:
//!
//! - A single logical connection with automatic reconnects (exponential
//!   backoff, bounded attempt count)
//! - Routing of inbound `{type, payload}` frames to a typed handler set
//! - Outbound sends gated on connection state
//! - Bounded, idempotent teardown
//!
//! The transport is abstracted behind [`connection::transport::Connector`];
//! [`connection::websocket::TungsteniteConnector`] is the default
//! implementation.

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod message;
pub mod metrics;

pub use client::WebSocketClient;
pub use config::ClientConfig;
pub use connection::state::ConnectionState;
pub use error::{ClientError, TransportError};
pub use handler::{CloseInfo, HandlerSet};
