mod client;
mod codec;
mod downloader;
mod error;
mod file_chunk;
mod handler;
mod interrupt;
mod messages;
mod pending;
mod storecopy;
mod timeout_loop;
mod tx_pull;

pub use client::CatchupClient;
pub use codec::ClientCodec;
pub use codec::ResponseFrame;
pub use codec::ServerCodec;
pub use downloader::CoreStateDownloader;
pub use downloader::DownloadError;
pub use downloader::DownloadOutcome;
pub use downloader::DownloadTarget;
pub use error::CatchupClientError;
pub use error::CatchupFailure;
pub use error::CodecError;
pub use file_chunk::FileChunk;
pub(crate) use handler::ResponseHandler;
pub use interrupt::InterruptListener;
pub use interrupt::Interrupter;
pub use messages::CatchupRequest;
pub use messages::CatchupResponse;
pub use messages::CommittedTransaction;
pub use messages::FileHeader;
pub use messages::GetStoreFileRequest;
pub use messages::PrepareStoreCopyRequest;
pub use messages::PrepareStoreCopyResponse;
pub use messages::PrepareStoreCopyStatus;
pub use messages::RequestMessageType;
pub use messages::ResponseMessageType;
pub use messages::StoreCopyFinishedResponse;
pub use messages::StoreCopyStatus;
pub use messages::TxPullRequest;
pub use messages::TxPullResponse;
pub use messages::TxStreamFinishedResponse;
pub use messages::TxStreamStatus;
pub use storecopy::cancellation;
pub use storecopy::CancellationCheck;
pub use storecopy::Canceller;
pub use storecopy::DirectoryStoreFileStreams;
pub use storecopy::InMemoryStoreFileStreams;
pub use storecopy::MaximumTotalTime;
pub use storecopy::Or;
pub use storecopy::StoreCopyClient;
pub use storecopy::StoreCopyFailed;
pub use storecopy::StoreFileStreams;
pub use storecopy::TerminationCondition;
pub use tx_pull::CollectingTxListener;
pub use tx_pull::TxPullResponseListener;
