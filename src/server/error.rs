use crate::catchup::CodecError;
use crate::protocol::HandshakeError;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum CatchupServerError {
    #[error("No free port in listen address {0}")]
    NoFreePort(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("Protocol handshake failed: {0}")]
    Handshake(#[from] HandshakeError),
}
