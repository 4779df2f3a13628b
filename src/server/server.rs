use crate::catchup::ServerCodec;
use crate::config::CatchupOptionsValidated;
use crate::messaging::{BoxedStream, ListenAddress};
use crate::protocol::{respond_to_handshake, PipelineWrapper, SupportedProtocols};
use crate::server::error::CatchupServerError;
use crate::server::handlers::{AfterRequest, RequestHandlers};
use crate::server::local_store::LocalStore;
use crate::server::CatchupServerShutdownSignal;
use crate::state_machine::CoreSnapshotService;
use futures::StreamExt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;

/// CatchupServer answers catchup requests from other members out of the local store and, on a
/// core member, the core state machines.
pub struct CatchupServer {
    logger: slog::Logger,
    local_store: Arc<dyn LocalStore>,
    snapshot_service: Option<Arc<dyn CoreSnapshotService>>,
    pipeline: Arc<dyn PipelineWrapper>,
    supported_protocols: Arc<SupportedProtocols>,
    max_chunk_size: usize,
    max_frame_bytes: usize,
}

struct ServerContext {
    logger: slog::Logger,
    handlers: RequestHandlers,
    pipeline: Arc<dyn PipelineWrapper>,
    supported_protocols: Arc<SupportedProtocols>,
    max_frame_bytes: usize,
}

impl CatchupServer {
    pub fn new(
        logger: slog::Logger,
        local_store: Arc<dyn LocalStore>,
        pipeline: Arc<dyn PipelineWrapper>,
        supported_protocols: Arc<SupportedProtocols>,
        options: &CatchupOptionsValidated,
    ) -> Self {
        CatchupServer {
            logger,
            local_store,
            snapshot_service: None,
            pipeline,
            supported_protocols,
            max_chunk_size: options.max_chunk_size,
            max_frame_bytes: options.max_frame_bytes,
        }
    }

    /// Core members serve their core state. Without this the server behaves as a read replica.
    pub fn with_snapshot_service(mut self, snapshot_service: Arc<dyn CoreSnapshotService>) -> Self {
        self.snapshot_service = Some(snapshot_service);
        self
    }

    /// Binds the first port of the listen range that is free.
    pub async fn bind(listen_address: &ListenAddress) -> Result<TcpListener, CatchupServerError> {
        for port in listen_address.ports() {
            match TcpListener::bind((listen_address.hostname(), port)).await {
                Ok(listener) => return Ok(listener),
                Err(e) if e.kind() == io::ErrorKind::AddrInUse => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(CatchupServerError::NoFreePort(listen_address.to_string()))
    }

    pub async fn run(self, listener: TcpListener, mut shutdown_signal: CatchupServerShutdownSignal) {
        let logger = self.logger.clone();
        match listener.local_addr() {
            Ok(addr) => slog::info!(logger, "Listening on '{:?}'", addr),
            Err(e) => slog::warn!(logger, "Listening on unknown address: {:?}", e),
        }

        let context = Arc::new(ServerContext {
            handlers: RequestHandlers::new(self.local_store, self.snapshot_service, self.max_chunk_size),
            logger: self.logger,
            pipeline: self.pipeline,
            supported_protocols: self.supported_protocols,
            max_frame_bytes: self.max_frame_bytes,
        });

        loop {
            tokio::select! {
                _ = &mut shutdown_signal => break,
                accepted = listener.accept() => match accepted {
                    Ok((socket, peer)) => {
                        let context = context.clone();
                        tokio::spawn(async move {
                            let logger = context.logger.new(slog::o!("Peer" => peer.to_string()));
                            if let Err(e) = serve_connection(&context, &logger, socket, peer).await {
                                slog::warn!(logger, "Connection ended with error: {}", e);
                            }
                        });
                    }
                    Err(e) => slog::warn!(logger, "Failed to accept connection: {:?}", e),
                },
            }
        }

        slog::info!(logger, "Server run() has exited");
    }
}

async fn serve_connection(
    context: &ServerContext,
    logger: &slog::Logger,
    socket: TcpStream,
    peer: SocketAddr,
) -> Result<(), CatchupServerError> {
    socket.set_nodelay(true)?;
    let mut stream: BoxedStream = context.pipeline.wrap(Box::new(socket));

    let protocol_stack = respond_to_handshake(&mut stream, &context.supported_protocols).await?;
    slog::info!(logger, "Connection from {} installed protocol stack {}", peer, protocol_stack);

    let mut framed = Framed::new(stream, ServerCodec::new(context.max_frame_bytes));
    while let Some(request) = framed.next().await {
        let request = request?;
        if context.handlers.handle(logger, request, &mut framed).await? == AfterRequest::Close {
            break;
        }
    }

    slog::debug!(logger, "Connection from {} closed", peer);
    Ok(())
}
