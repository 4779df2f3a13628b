use crate::catchup::messages::ResponseMessageType;
use crate::protocol::HandshakeError;
use std::io;
use tokio::time::Duration;

/// CodecError is anything that can go wrong turning bytes into catchup messages and back.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Unknown message type tag {0}")]
    UnknownMessageType(u8),
    #[error("Frame of {size} bytes exceeds the limit of {max} bytes")]
    FrameTooLarge { size: usize, max: usize },
    #[error("Malformed message body: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("Failed to encode message body: {0}")]
    Encode(#[from] prost::EncodeError),
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

/// CatchupFailure is the root cause of a failed catchup request.
#[derive(Debug, thiserror::Error)]
pub enum CatchupFailure {
    #[error("Connection failure: {0}")]
    Connection(#[from] io::Error),
    #[error("Connection closed by remote before the response completed")]
    ConnectionClosed,
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("Protocol handshake failed: {0}")]
    Handshake(#[from] HandshakeError),
    #[error("Unexpected {0:?} response")]
    UnexpectedResponse(ResponseMessageType),
    #[error("Request was lost in transit")]
    RequestLost,
    #[error("Request task ended without a result")]
    Abandoned,
    #[error("No response received within {timeout:?}")]
    NeverResponded { timeout: Duration },
    #[error("No response for {since_last_response:?}, inactivity timeout is {timeout:?}")]
    Stalled {
        since_last_response: Duration,
        timeout: Duration,
    },
    #[error("Interrupted while waiting for response")]
    Interrupted,
    #[error("Failed to write received data: {0}")]
    Sink(io::Error),
}

/// CatchupClientError is a failed catchup request: what was being attempted and why it failed.
#[derive(Debug, thiserror::Error)]
#[error("Catchup operation '{operation}' failed: {cause}")]
pub struct CatchupClientError {
    operation: String,
    #[source]
    cause: CatchupFailure,
}

impl CatchupClientError {
    pub fn new(operation: impl Into<String>, cause: CatchupFailure) -> Self {
        CatchupClientError {
            operation: operation.into(),
            cause,
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn cause(&self) -> &CatchupFailure {
        &self.cause
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self.cause, CatchupFailure::Interrupted)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self.cause,
            CatchupFailure::NeverResponded { .. } | CatchupFailure::Stalled { .. }
        )
    }
}
