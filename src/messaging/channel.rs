use crate::catchup::{CatchupFailure, CatchupRequest, ClientCodec, ResponseHandler};
use crate::messaging::{AdvertisedSocketAddress, BoxedStream, Connector, MessageDelay, NetworkLatencyStrategy};
use crate::protocol::{initiate_handshake, PipelineWrapper, ProtocolStack, SupportedProtocols};
use futures::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex};
use tokio_util::codec::Framed;

/// Everything a channel needs to open and set up a connection. Shared by all channels of a
/// client.
#[derive(Clone)]
pub struct ChannelSettings {
    pub connector: Arc<dyn Connector>,
    pub pipeline: Arc<dyn PipelineWrapper>,
    pub supported_protocols: Arc<SupportedProtocols>,
    pub latency: Arc<dyn NetworkLatencyStrategy>,
    pub max_frame_bytes: usize,
}

/// ReconnectingChannel is the handle to one remote address. It connects lazily on first use and
/// again after any failure, so callers never deal with connection state.
///
/// The catchup protocol is half-duplex, so a channel carries one request at a time; concurrent
/// requests to the same address queue up behind each other.
pub struct ReconnectingChannel {
    logger: slog::Logger,
    address: AdvertisedSocketAddress,
    settings: ChannelSettings,
    connection: tokio::sync::Mutex<Option<Connection>>,
    installed_protocol_stack: Arc<Mutex<Option<ProtocolStack>>>,
}

struct Connection {
    framed: Framed<BoxedStream, ClientCodec>,
    installed_protocol_stack: Arc<Mutex<Option<ProtocolStack>>>,
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.installed_protocol_stack
            .lock()
            .expect("Connection.drop() mutex guard poison")
            .take();
    }
}

impl ReconnectingChannel {
    pub fn new(logger: slog::Logger, address: AdvertisedSocketAddress, settings: ChannelSettings) -> Self {
        let logger = logger.new(slog::o!("Remote" => address.to_string()));
        ReconnectingChannel {
            logger,
            address,
            settings,
            connection: tokio::sync::Mutex::new(None),
            installed_protocol_stack: Arc::new(Mutex::new(None)),
        }
    }

    pub fn address(&self) -> &AdvertisedSocketAddress {
        &self.address
    }

    /// The stack negotiated on the current connection, if there is one.
    pub fn installed_protocol_stack(&self) -> Option<ProtocolStack> {
        self.installed_protocol_stack
            .lock()
            .expect("ReconnectingChannel.installed_protocol_stack() mutex guard poison")
            .clone()
    }

    /// Closes the current connection, if any. The next request reconnects.
    pub async fn dispose(&self) {
        self.connection.lock().await.take();
    }

    /// Sends `request` and feeds every response to `handler` until it reports completion.
    /// `on_response` is called for each response received.
    ///
    /// The connection is only kept for the next request when this one completed cleanly. If this
    /// future is dropped mid-way, the connection goes with it.
    pub(crate) async fn exchange<H, F>(
        &self,
        request: CatchupRequest,
        mut handler: H,
        mut on_response: F,
    ) -> Result<H::Output, CatchupFailure>
    where
        H: ResponseHandler,
        F: FnMut() + Send,
    {
        let mut slot = self.connection.lock().await;
        let mut connection = match slot.take() {
            Some(connection) => connection,
            None => self.connect().await?,
        };

        match self.settings.latency.message_delay(request.message_type(), &self.address) {
            MessageDelay::Deliver(delay) => {
                if delay.as_nanos() > 0 {
                    tokio::time::sleep(delay).await;
                }
            }
            MessageDelay::Lost => {
                slog::debug!(self.logger, "Dropping {:?} request", request.message_type());
                slot.replace(connection);
                futures::future::pending::<()>().await;
                return Err(CatchupFailure::RequestLost);
            }
        }

        slog::debug!(self.logger, "Sending {:?} request", request.message_type());
        connection.framed.send(request).await?;

        loop {
            let response = match connection.framed.next().await {
                Some(response) => response?,
                None => return Err(CatchupFailure::ConnectionClosed),
            };
            on_response();

            if let Some(output) = handler.on_response(response).await? {
                slot.replace(connection);
                return Ok(output);
            }
        }
    }

    async fn connect(&self) -> Result<Connection, CatchupFailure> {
        slog::debug!(self.logger, "Connecting");
        let stream = self.settings.connector.connect(&self.address).await?;
        let mut stream = self.settings.pipeline.wrap(stream);

        let protocol_stack = initiate_handshake(&mut stream, &self.settings.supported_protocols).await?;
        slog::info!(self.logger, "Connected with protocol stack {}", protocol_stack);

        self.installed_protocol_stack
            .lock()
            .expect("ReconnectingChannel.connect() mutex guard poison")
            .replace(protocol_stack);

        Ok(Connection {
            framed: Framed::new(stream, ClientCodec::new(self.settings.max_frame_bytes)),
            installed_protocol_stack: self.installed_protocol_stack.clone(),
        })
    }
}
