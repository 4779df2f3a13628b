use crate::messaging::AdvertisedSocketAddress;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::Duration;

/// Any bidirectional byte stream a catchup connection can run over.
pub trait AsyncStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> AsyncStream for T {}

pub type BoxedStream = Box<dyn AsyncStream>;

/// Connector opens the raw stream to a remote member.
#[async_trait::async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, address: &AdvertisedSocketAddress) -> io::Result<BoxedStream>;
}

pub struct TcpConnector {
    connect_timeout: Duration,
}

impl TcpConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        TcpConnector { connect_timeout }
    }
}

#[async_trait::async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, address: &AdvertisedSocketAddress) -> io::Result<BoxedStream> {
        let connect = TcpStream::connect((address.hostname(), address.port()));
        let stream = match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(stream) => stream?,
            Err(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("Connecting to {} timed out after {:?}", address, self.connect_timeout),
                ))
            }
        };
        stream.set_nodelay(true)?;
        Ok(Box::new(stream))
    }
}
