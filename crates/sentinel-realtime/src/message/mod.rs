//! Wire messages: envelope shape, encoding, validation, and routing.

pub mod envelope;
pub mod payload;
pub mod router;
pub mod serializer;
pub mod types;
pub mod validator;

pub use envelope::{Envelope, InboundFrame};
pub use router::{MessageRouter, RouteOutcome};
pub use types::MessageKind;
