mod error;
mod handlers;
mod local_store;
mod server;
mod shutdown;

pub use error::CatchupServerError;
pub use local_store::InMemoryLocalStore;
pub use local_store::LocalStore;
pub use local_store::StoreFile;
pub use local_store::BASE_TX_ID;
pub use server::CatchupServer;
pub use shutdown::shutdown_signal;
pub use shutdown::CatchupServerShutdownHandle;
pub use shutdown::CatchupServerShutdownSignal;
