use crate::catchup::{
    CatchupRequest, CatchupResponse, FileChunk, FileHeader, GetStoreFileRequest, PrepareStoreCopyRequest,
    PrepareStoreCopyResponse, PrepareStoreCopyStatus, ResponseFrame, ResponseMessageType, ServerCodec,
    StoreCopyFinishedResponse, StoreCopyStatus, TxPullRequest, TxPullResponse, TxStreamFinishedResponse,
    TxStreamStatus,
};
use crate::messaging::BoxedStream;
use crate::server::error::CatchupServerError;
use crate::server::local_store::LocalStore;
use crate::state_machine::CoreSnapshotService;
use bytes::Bytes;
use futures::SinkExt;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::codec::Framed;

pub(super) type ServerFramed = Framed<BoxedStream, ServerCodec>;

/// What the connection does once a request has been answered.
#[derive(Debug, Eq, PartialEq)]
pub(super) enum AfterRequest {
    ExpectNext,
    Close,
}

pub(super) struct RequestHandlers {
    local_store: Arc<dyn LocalStore>,
    snapshot_service: Option<Arc<dyn CoreSnapshotService>>,
    max_chunk_size: usize,
}

impl RequestHandlers {
    pub(super) fn new(
        local_store: Arc<dyn LocalStore>,
        snapshot_service: Option<Arc<dyn CoreSnapshotService>>,
        max_chunk_size: usize,
    ) -> Self {
        RequestHandlers {
            local_store,
            snapshot_service,
            max_chunk_size,
        }
    }

    pub(super) async fn handle(
        &self,
        logger: &slog::Logger,
        request: CatchupRequest,
        framed: &mut ServerFramed,
    ) -> Result<AfterRequest, CatchupServerError> {
        slog::debug!(logger, "Handling {:?}", request);

        let after = match request {
            CatchupRequest::GetStoreId => self.handle_get_store_id(framed).await?,
            CatchupRequest::CoreSnapshot => self.handle_core_snapshot(logger, framed).await?,
            CatchupRequest::PrepareStoreCopy(r) => self.handle_prepare_store_copy(logger, r, framed).await?,
            CatchupRequest::GetStoreFile(r) => self.handle_get_store_file(logger, r, framed).await?,
            CatchupRequest::TxPull(r) => self.handle_tx_pull(logger, r, framed).await?,
        };

        if after == AfterRequest::ExpectNext {
            framed.codec_mut().expect_message_type();
        }
        Ok(after)
    }

    async fn handle_get_store_id(&self, framed: &mut ServerFramed) -> Result<AfterRequest, CatchupServerError> {
        let store_id = self.local_store.store_id();
        send_response(framed, CatchupResponse::StoreId(store_id)).await?;
        Ok(AfterRequest::ExpectNext)
    }

    async fn handle_core_snapshot(
        &self,
        logger: &slog::Logger,
        framed: &mut ServerFramed,
    ) -> Result<AfterRequest, CatchupServerError> {
        let snapshot_service = match &self.snapshot_service {
            Some(service) => service,
            None => {
                slog::warn!(logger, "Asked for a core snapshot but this member has none. Closing connection.");
                return Ok(AfterRequest::Close);
            }
        };

        let snapshot = snapshot_service.snapshot();
        send_response(framed, CatchupResponse::CoreSnapshot(snapshot)).await?;
        Ok(AfterRequest::ExpectNext)
    }

    async fn handle_prepare_store_copy(
        &self,
        logger: &slog::Logger,
        request: PrepareStoreCopyRequest,
        framed: &mut ServerFramed,
    ) -> Result<AfterRequest, CatchupServerError> {
        let local_store_id = self.local_store.store_id();
        let response = if request.store_id() != local_store_id {
            slog::warn!(
                logger,
                "Store copy requested for {} but local store is {}",
                request.store_id(),
                local_store_id
            );
            PrepareStoreCopyResponse::error(PrepareStoreCopyStatus::StoreIdMismatch)
        } else {
            match self.local_store.list_store_files() {
                Ok(files) => PrepareStoreCopyResponse::success(files, self.local_store.last_committed_tx_id()),
                Err(e) => {
                    slog::error!(logger, "Failed to list store files: {:?}", e);
                    PrepareStoreCopyResponse::error(PrepareStoreCopyStatus::ListingFailed)
                }
            }
        };

        send_response(framed, CatchupResponse::PrepareStoreCopy(response)).await?;
        Ok(AfterRequest::ExpectNext)
    }

    async fn handle_get_store_file(
        &self,
        logger: &slog::Logger,
        request: GetStoreFileRequest,
        framed: &mut ServerFramed,
    ) -> Result<AfterRequest, CatchupServerError> {
        let last_committed_tx_id = self.local_store.last_committed_tx_id();

        if request.store_id != self.local_store.store_id() {
            self.finish_store_copy(framed, StoreCopyStatus::StoreIdMismatch, last_committed_tx_id)
                .await?;
            return Ok(AfterRequest::ExpectNext);
        }
        if last_committed_tx_id < request.required_tx_id {
            slog::warn!(
                logger,
                "File '{}' requires tx {} but last committed is {}",
                request.file_name,
                request.required_tx_id,
                last_committed_tx_id
            );
            self.finish_store_copy(framed, StoreCopyStatus::TooFarBehind, last_committed_tx_id)
                .await?;
            return Ok(AfterRequest::ExpectNext);
        }

        let store_file = match self.local_store.open_store_file(&request.file_name).await? {
            Some(store_file) => store_file,
            None => {
                slog::warn!(logger, "Requested unknown file '{}'", request.file_name);
                self.finish_store_copy(framed, StoreCopyStatus::UnknownFile, last_committed_tx_id)
                    .await?;
                return Ok(AfterRequest::ExpectNext);
            }
        };

        framed.feed(ResponseFrame::Marker(ResponseMessageType::File)).await?;
        framed
            .feed(ResponseFrame::Payload(CatchupResponse::FileHeader(FileHeader {
                file_name: request.file_name.clone(),
                required_alignment: store_file.required_alignment,
            })))
            .await?;

        framed.feed(ResponseFrame::Marker(ResponseMessageType::FileChunk)).await?;
        let mut reader = store_file.reader;
        let mut current = read_chunk(&mut reader, self.max_chunk_size).await?;
        loop {
            // Only a short read proves the end. A full one needs the next chunk to know.
            if current.len() < self.max_chunk_size {
                break;
            }
            let next = read_chunk(&mut reader, self.max_chunk_size).await?;
            if next.is_empty() {
                break;
            }
            let chunk = std::mem::replace(&mut current, next);
            framed
                .feed(ResponseFrame::Payload(CatchupResponse::FileChunk(FileChunk::new(chunk, false))))
                .await?;
        }
        framed
            .feed(ResponseFrame::Payload(CatchupResponse::FileChunk(FileChunk::new(current, true))))
            .await?;

        self.finish_store_copy(framed, StoreCopyStatus::Success, last_committed_tx_id)
            .await?;
        Ok(AfterRequest::ExpectNext)
    }

    async fn finish_store_copy(
        &self,
        framed: &mut ServerFramed,
        status: StoreCopyStatus,
        last_tx_id: i64,
    ) -> Result<(), CatchupServerError> {
        let finished = StoreCopyFinishedResponse { status, last_tx_id };
        send_response(framed, CatchupResponse::StoreCopyFinished(finished)).await
    }

    async fn handle_tx_pull(
        &self,
        logger: &slog::Logger,
        request: TxPullRequest,
        framed: &mut ServerFramed,
    ) -> Result<AfterRequest, CatchupServerError> {
        let local_store_id = self.local_store.store_id();
        let last_committed_tx_id = self.local_store.last_committed_tx_id();

        if request.store_id != local_store_id {
            slog::warn!(
                logger,
                "Tx pull requested for {} but local store is {}",
                request.store_id,
                local_store_id
            );
            self.finish_tx_stream(framed, TxStreamStatus::StoreIdMismatch, last_committed_tx_id)
                .await?;
            return Ok(AfterRequest::ExpectNext);
        }
        if !self.local_store.is_available() {
            self.finish_tx_stream(framed, TxStreamStatus::StoreUnavailable, last_committed_tx_id)
                .await?;
            return Ok(AfterRequest::ExpectNext);
        }

        let first_tx_id = match request.previous_tx_id.checked_add(1) {
            Some(first_tx_id) if first_tx_id <= last_committed_tx_id => first_tx_id,
            // Nothing can follow the requested id.
            _ => {
                self.finish_tx_stream(framed, TxStreamStatus::SuccessEndOfStream, last_committed_tx_id)
                    .await?;
                return Ok(AfterRequest::ExpectNext);
            }
        };
        if self.local_store.first_available_tx_id() > first_tx_id {
            slog::info!(logger, "Tx {} requested but has been pruned", first_tx_id);
            self.finish_tx_stream(framed, TxStreamStatus::TransactionPruned, last_committed_tx_id)
                .await?;
            return Ok(AfterRequest::ExpectNext);
        }

        let mut latest_tx_id = request.previous_tx_id;
        for tx in self.local_store.transactions_after(request.previous_tx_id)? {
            latest_tx_id = tx.tx_id;
            framed.feed(ResponseFrame::Marker(ResponseMessageType::Tx)).await?;
            framed
                .feed(ResponseFrame::Payload(CatchupResponse::TxPull(TxPullResponse::new(
                    local_store_id,
                    tx,
                ))))
                .await?;
        }
        slog::debug!(logger, "Streamed txs {} to {}", first_tx_id, latest_tx_id);

        self.finish_tx_stream(framed, TxStreamStatus::SuccessEndOfStream, latest_tx_id)
            .await?;
        Ok(AfterRequest::ExpectNext)
    }

    async fn finish_tx_stream(
        &self,
        framed: &mut ServerFramed,
        status: TxStreamStatus,
        latest_tx_id: i64,
    ) -> Result<(), CatchupServerError> {
        let finished = TxStreamFinishedResponse { status, latest_tx_id };
        send_response(framed, CatchupResponse::TxStreamFinished(finished)).await
    }
}

/// Writes a marker and the response it announces, then flushes everything fed so far.
async fn send_response(framed: &mut ServerFramed, response: CatchupResponse) -> Result<(), CatchupServerError> {
    framed.feed(ResponseFrame::Marker(response.message_type())).await?;
    framed.send(ResponseFrame::Payload(response)).await?;
    Ok(())
}

/// Reads until `max` bytes are buffered or the reader is exhausted.
async fn read_chunk<R>(reader: &mut R, max: usize) -> io::Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; max];
    let mut filled = 0;
    while filled < max {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(Bytes::from(buf))
}
