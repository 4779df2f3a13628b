use causal_cluster::{
    create_root_logger_for_stdout, shutdown_signal, CatchupOptions, CatchupOptionsValidated, CatchupServer,
    CoreStateMachines, InMemoryLocalStore, InMemoryStateStorage, ListenAddress, MemberId, StoreId,
    SupportedProtocols, VoidPipelineWrapper,
};
use std::convert::TryFrom;
use std::sync::Arc;

/// Serves an in-memory store over the catchup protocol until ctrl-c.
///
/// Usage: `catchup-server [host:port or host:first-last]`, defaulting to `127.0.0.1:6000-6010`.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let listen_address: ListenAddress = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:6000-6010".to_string())
        .parse()?;
    let member_id = MemberId::new("demo-core");
    let logger = create_root_logger_for_stdout(&member_id);
    let options = CatchupOptionsValidated::try_from(CatchupOptions::default())?;

    let local_store = Arc::new(InMemoryLocalStore::new(StoreId::generate()));
    local_store.put_file("neostore", &b"demo store contents"[..]);
    local_store.commit(&b"first transaction"[..]);
    let core_state = Arc::new(CoreStateMachines::new(InMemoryStateStorage::new())?);

    let listener = CatchupServer::bind(&listen_address).await?;
    let server = CatchupServer::new(
        logger.clone(),
        local_store,
        Arc::new(VoidPipelineWrapper),
        Arc::new(SupportedProtocols::catchup()),
        &options,
    )
    .with_snapshot_service(core_state);

    let (shutdown_handle, shutdown) = shutdown_signal();
    let server_task = tokio::spawn(server.run(listener, shutdown));

    tokio::signal::ctrl_c().await?;
    slog::info!(logger, "Received ctrl-c, shutting down");
    shutdown_handle.shutdown();
    server_task.await?;

    Ok(())
}
