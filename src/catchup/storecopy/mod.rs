mod client;
mod error;
mod streams;
mod termination;

pub use client::StoreCopyClient;
pub use error::StoreCopyFailed;
pub use streams::DirectoryStoreFileStreams;
pub use streams::InMemoryStoreFileStreams;
pub use streams::StoreFileStreams;
pub use termination::cancellation;
pub use termination::CancellationCheck;
pub use termination::Canceller;
pub use termination::MaximumTotalTime;
pub use termination::Or;
pub use termination::TerminationCondition;
