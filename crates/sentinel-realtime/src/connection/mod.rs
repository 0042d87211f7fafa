//! Connection lifecycle: transport contract, backoff policy, state machine,
//! and the outbound gate.

pub mod backoff;
pub mod gate;
pub mod manager;
pub mod state;
pub mod transport;
pub mod websocket;

pub use backoff::ReconnectPolicy;
pub use state::ConnectionState;
pub use transport::{Connector, ReadyState, Transport, TransportEvents};
pub use websocket::TungsteniteConnector;
