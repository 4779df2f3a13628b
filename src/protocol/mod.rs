mod handshake;
mod pipeline;
mod stack;

pub use handshake::initiate_handshake;
pub use handshake::respond_to_handshake;
pub use handshake::HandshakeError;
pub use pipeline::PipelineWrapper;
pub use pipeline::VoidPipelineWrapper;
pub use stack::ApplicationProtocol;
pub use stack::ModifierProtocol;
pub use stack::ProtocolSelection;
pub use stack::ProtocolStack;
pub use stack::SupportedProtocols;
pub use stack::CATCHUP_PROTOCOL;
