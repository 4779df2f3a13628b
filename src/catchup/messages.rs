//! The catchup protocol's message shapes. Every request and response knows its own message-type
//! tag, which is what goes on the wire ahead of the body.

use crate::catchup::error::CodecError;
use crate::catchup::file_chunk::FileChunk;
use crate::identity::StoreId;
use crate::state_machine::CoreSnapshot;
use bytes::Bytes;
use std::convert::TryFrom;
use std::fmt;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum RequestMessageType {
    TxPull,
    GetStoreFile,
    CoreSnapshot,
    GetStoreId,
    PrepareStoreCopy,
}

impl RequestMessageType {
    pub fn tag(&self) -> u8 {
        match self {
            RequestMessageType::TxPull => 1,
            RequestMessageType::GetStoreFile => 2,
            RequestMessageType::CoreSnapshot => 3,
            RequestMessageType::GetStoreId => 4,
            RequestMessageType::PrepareStoreCopy => 5,
        }
    }
}

impl TryFrom<u8> for RequestMessageType {
    type Error = CodecError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            1 => Ok(RequestMessageType::TxPull),
            2 => Ok(RequestMessageType::GetStoreFile),
            3 => Ok(RequestMessageType::CoreSnapshot),
            4 => Ok(RequestMessageType::GetStoreId),
            5 => Ok(RequestMessageType::PrepareStoreCopy),
            unknown => Err(CodecError::UnknownMessageType(unknown)),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ResponseMessageType {
    Tx,
    StoreId,
    File,
    StoreCopyFinished,
    CoreSnapshot,
    TxStreamFinished,
    PrepareStoreCopyResponse,
    FileChunk,
}

impl ResponseMessageType {
    pub fn tag(&self) -> u8 {
        match self {
            ResponseMessageType::Tx => 1,
            ResponseMessageType::StoreId => 2,
            ResponseMessageType::File => 3,
            ResponseMessageType::StoreCopyFinished => 4,
            ResponseMessageType::CoreSnapshot => 5,
            ResponseMessageType::TxStreamFinished => 6,
            ResponseMessageType::PrepareStoreCopyResponse => 7,
            ResponseMessageType::FileChunk => 8,
        }
    }
}

impl TryFrom<u8> for ResponseMessageType {
    type Error = CodecError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            1 => Ok(ResponseMessageType::Tx),
            2 => Ok(ResponseMessageType::StoreId),
            3 => Ok(ResponseMessageType::File),
            4 => Ok(ResponseMessageType::StoreCopyFinished),
            5 => Ok(ResponseMessageType::CoreSnapshot),
            6 => Ok(ResponseMessageType::TxStreamFinished),
            7 => Ok(ResponseMessageType::PrepareStoreCopyResponse),
            8 => Ok(ResponseMessageType::FileChunk),
            unknown => Err(CodecError::UnknownMessageType(unknown)),
        }
    }
}

// ------- Requests --------

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CatchupRequest {
    GetStoreId,
    CoreSnapshot,
    PrepareStoreCopy(PrepareStoreCopyRequest),
    GetStoreFile(GetStoreFileRequest),
    TxPull(TxPullRequest),
}

impl CatchupRequest {
    pub fn message_type(&self) -> RequestMessageType {
        match self {
            CatchupRequest::GetStoreId => RequestMessageType::GetStoreId,
            CatchupRequest::CoreSnapshot => RequestMessageType::CoreSnapshot,
            CatchupRequest::PrepareStoreCopy(_) => RequestMessageType::PrepareStoreCopy,
            CatchupRequest::GetStoreFile(_) => RequestMessageType::GetStoreFile,
            CatchupRequest::TxPull(_) => RequestMessageType::TxPull,
        }
    }
}

/// First step of a store copy. The responder refuses if its own store id differs from the one
/// the requester expects.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PrepareStoreCopyRequest {
    store_id: StoreId,
}

impl PrepareStoreCopyRequest {
    pub fn new(expected_store_id: StoreId) -> Self {
        PrepareStoreCopyRequest {
            store_id: expected_store_id,
        }
    }

    pub fn store_id(&self) -> StoreId {
        self.store_id
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GetStoreFileRequest {
    pub store_id: StoreId,
    pub file_name: String,
    pub required_tx_id: i64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TxPullRequest {
    pub store_id: StoreId,
    pub previous_tx_id: i64,
}

// ------- Responses --------

#[derive(Debug)]
pub enum CatchupResponse {
    StoreId(StoreId),
    CoreSnapshot(CoreSnapshot),
    PrepareStoreCopy(PrepareStoreCopyResponse),
    FileHeader(FileHeader),
    FileChunk(FileChunk),
    StoreCopyFinished(StoreCopyFinishedResponse),
    TxPull(TxPullResponse),
    TxStreamFinished(TxStreamFinishedResponse),
}

impl CatchupResponse {
    pub fn message_type(&self) -> ResponseMessageType {
        match self {
            CatchupResponse::StoreId(_) => ResponseMessageType::StoreId,
            CatchupResponse::CoreSnapshot(_) => ResponseMessageType::CoreSnapshot,
            CatchupResponse::PrepareStoreCopy(_) => ResponseMessageType::PrepareStoreCopyResponse,
            CatchupResponse::FileHeader(_) => ResponseMessageType::File,
            CatchupResponse::FileChunk(_) => ResponseMessageType::FileChunk,
            CatchupResponse::StoreCopyFinished(_) => ResponseMessageType::StoreCopyFinished,
            CatchupResponse::TxPull(_) => ResponseMessageType::Tx,
            CatchupResponse::TxStreamFinished(_) => ResponseMessageType::TxStreamFinished,
        }
    }
}

/// A committed transaction as handed over by the storage engine. The payload is opaque to the
/// catchup layer.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CommittedTransaction {
    pub tx_id: i64,
    pub payload: Bytes,
}

/// One pulled transaction. Two responses are equal iff both the store id and the transaction
/// are equal.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TxPullResponse {
    store_id: StoreId,
    tx: CommittedTransaction,
}

impl TxPullResponse {
    pub fn new(store_id: StoreId, tx: CommittedTransaction) -> Self {
        TxPullResponse { store_id, tx }
    }

    pub fn store_id(&self) -> StoreId {
        self.store_id
    }

    pub fn tx(&self) -> &CommittedTransaction {
        &self.tx
    }

    pub fn into_tx(self) -> CommittedTransaction {
        self.tx
    }
}

impl fmt::Display for TxPullResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxPullResponse{{storeId={}, txId={}}}", self.store_id, self.tx.tx_id)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PrepareStoreCopyStatus {
    Success,
    StoreIdMismatch,
    ListingFailed,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PrepareStoreCopyResponse {
    pub status: PrepareStoreCopyStatus,
    pub files: Vec<String>,
    pub last_tx_id: i64,
}

impl PrepareStoreCopyResponse {
    pub fn success(files: Vec<String>, last_tx_id: i64) -> Self {
        PrepareStoreCopyResponse {
            status: PrepareStoreCopyStatus::Success,
            files,
            last_tx_id,
        }
    }

    pub fn error(status: PrepareStoreCopyStatus) -> Self {
        PrepareStoreCopyResponse {
            status,
            files: vec![],
            last_tx_id: 0,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileHeader {
    pub file_name: String,
    pub required_alignment: i32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StoreCopyStatus {
    Success,
    StoreIdMismatch,
    UnknownFile,
    TooFarBehind,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StoreCopyFinishedResponse {
    pub status: StoreCopyStatus,
    pub last_tx_id: i64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TxStreamStatus {
    SuccessEndOfStream,
    StoreIdMismatch,
    TransactionPruned,
    StoreUnavailable,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TxStreamFinishedResponse {
    pub status: TxStreamStatus,
    pub latest_tx_id: i64,
}

// ------- Wire status codes --------

macro_rules! status_codes {
    ($status:ident { $($variant:ident => $code:expr),+ $(,)? }) => {
        impl $status {
            pub(crate) fn code(&self) -> i32 {
                match self {
                    $($status::$variant => $code,)+
                }
            }
        }

        impl TryFrom<i32> for $status {
            type Error = CodecError;

            fn try_from(code: i32) -> Result<Self, Self::Error> {
                match code {
                    $($code => Ok($status::$variant),)+
                    unknown => Err(CodecError::InvalidMessage(format!(
                        "unknown {} code {}",
                        stringify!($status),
                        unknown
                    ))),
                }
            }
        }
    };
}

status_codes!(PrepareStoreCopyStatus {
    Success => 0,
    StoreIdMismatch => 1,
    ListingFailed => 2,
});

status_codes!(StoreCopyStatus {
    Success => 0,
    StoreIdMismatch => 1,
    UnknownFile => 2,
    TooFarBehind => 3,
});

status_codes!(TxStreamStatus {
    SuccessEndOfStream => 0,
    StoreIdMismatch => 1,
    TransactionPruned => 2,
    StoreUnavailable => 3,
});
