use crate::catchup::error::CatchupClientError;
use crate::catchup::messages::StoreCopyStatus;
use crate::identity::StoreId;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum StoreCopyFailed {
    #[error("{0}")]
    Terminated(String),
    #[error("Store copy was cancelled")]
    Cancelled,
    #[error("Remote does not serve store {expected}")]
    StoreIdMismatch { expected: StoreId },
    #[error("Remote failed to list its store files")]
    ListingFailed,
    #[error("Copy of file '{file_name}' failed with status {status:?}")]
    FileCopy { file_name: String, status: StoreCopyStatus },
    #[error(transparent)]
    Catchup(#[from] CatchupClientError),
    #[error("Failed to prepare local store files: {0}")]
    Io(#[from] io::Error),
}

impl StoreCopyFailed {
    /// Whether trying the same step again could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreCopyFailed::Terminated(_) | StoreCopyFailed::Cancelled => false,
            StoreCopyFailed::StoreIdMismatch { .. } => false,
            StoreCopyFailed::FileCopy { status, .. } => *status != StoreCopyStatus::StoreIdMismatch,
            StoreCopyFailed::ListingFailed => true,
            StoreCopyFailed::Catchup(e) => !e.is_interrupted(),
            StoreCopyFailed::Io(_) => false,
        }
    }
}
