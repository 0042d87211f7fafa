//! Error types surfaced by the live-update client.
//!
//! None of these escape a lifecycle callback: they are handed to the
//! `on_error` handler and logged.

use thiserror::Error;

use sentinel_core::error::{AppError, ErrorKind};

/// Failures reported by a transport implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The transport could not be constructed (bad URL, no runtime, ...).
    #[error("failed to create transport for {url}: {reason}")]
    Create {
        /// Target URL.
        url: String,
        /// Underlying cause.
        reason: String,
    },
    /// The opening handshake failed.
    #[error("handshake failed: {0}")]
    Handshake(String),
    /// A send was attempted on a transport that is not open.
    #[error("transport is not open")]
    NotOpen,
    /// Writing a frame failed.
    #[error("send failed: {0}")]
    Send(String),
    /// The connection reported a protocol or I/O error.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Errors delivered to the `on_error` handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// An inbound frame was not valid JSON.
    #[error("failed to decode frame: {0}")]
    Decode(String),
    /// An inbound frame was empty or whitespace only.
    #[error("received empty frame")]
    EmptyFrame,
    /// An inbound frame exceeded the configured size limit.
    #[error("frame of {size} bytes exceeds limit of {limit} bytes")]
    FrameTooLarge {
        /// Frame size in bytes.
        size: usize,
        /// Configured maximum.
        limit: usize,
    },
    /// An outbound message could not be encoded.
    #[error("failed to encode message: {0}")]
    Encode(String),
    /// The transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        let kind = match &err {
            ClientError::Decode(_) | ClientError::Encode(_) => ErrorKind::Serialization,
            ClientError::EmptyFrame | ClientError::FrameTooLarge { .. } => ErrorKind::Validation,
            ClientError::Transport(TransportError::NotOpen) => ErrorKind::NotConnected,
            ClientError::Transport(_) => ErrorKind::Transport,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_into_app_error_kind() {
        let err: AppError = ClientError::Decode("expected value".into()).into();
        assert_eq!(err.kind, ErrorKind::Serialization);

        let err: AppError = ClientError::from(TransportError::NotOpen).into();
        assert_eq!(err.kind, ErrorKind::NotConnected);

        let err: AppError = ClientError::FrameTooLarge { size: 10, limit: 5 }.into();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
