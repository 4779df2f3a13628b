mod address;
mod channel;
mod channels;
mod connector;
mod fault;

pub use address::AddressParseError;
pub use address::AdvertisedSocketAddress;
pub use address::ListenAddress;
pub use address::PortIterator;
pub use channel::ChannelSettings;
pub use channel::ReconnectingChannel;
pub use channels::ReconnectingChannels;
pub use connector::AsyncStream;
pub use connector::BoxedStream;
pub use connector::Connector;
pub use connector::TcpConnector;
pub use fault::FixedDelayStrategy;
pub use fault::MessageDelay;
pub use fault::NetworkLatencyStrategy;
pub use fault::NoLatency;
pub use fault::RandomDropStrategy;
