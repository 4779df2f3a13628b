use crate::catchup::error::CatchupFailure;
use crate::catchup::messages::{
    CatchupResponse, ResponseMessageType, StoreCopyFinishedResponse, TxStreamFinishedResponse,
};
use crate::catchup::storecopy::StoreFileStreams;
use crate::catchup::tx_pull::TxPullResponseListener;
use std::sync::Arc;

/// ResponseHandler consumes the responses to one request as they are decoded, and says when the
/// response is complete.
#[async_trait::async_trait]
pub(crate) trait ResponseHandler: Send + 'static {
    type Output: Send + 'static;

    /// Returns `Some` with the final result once the last response of the request was seen.
    async fn on_response(&mut self, response: CatchupResponse) -> Result<Option<Self::Output>, CatchupFailure>;
}

/// For requests answered by exactly one message.
pub(crate) struct SingleResponse<T> {
    extract: fn(CatchupResponse) -> Result<T, CatchupResponse>,
}

impl<T> SingleResponse<T> {
    pub(crate) fn new(extract: fn(CatchupResponse) -> Result<T, CatchupResponse>) -> Self {
        SingleResponse { extract }
    }
}

#[async_trait::async_trait]
impl<T: Send + 'static> ResponseHandler for SingleResponse<T> {
    type Output = T;

    async fn on_response(&mut self, response: CatchupResponse) -> Result<Option<T>, CatchupFailure> {
        match (self.extract)(response) {
            Ok(value) => Ok(Some(value)),
            Err(other) => Err(CatchupFailure::UnexpectedResponse(other.message_type())),
        }
    }
}

/// Writes one streamed store file into the destination streams. The file header comes first,
/// then the chunks, then the finishing status. A refused request carries only the status.
pub(crate) struct StoreFileHandler {
    streams: Arc<dyn StoreFileStreams>,
    current: Option<(String, i32)>,
}

impl StoreFileHandler {
    pub(crate) fn new(streams: Arc<dyn StoreFileStreams>) -> Self {
        StoreFileHandler { streams, current: None }
    }
}

#[async_trait::async_trait]
impl ResponseHandler for StoreFileHandler {
    type Output = StoreCopyFinishedResponse;

    async fn on_response(
        &mut self,
        response: CatchupResponse,
    ) -> Result<Option<StoreCopyFinishedResponse>, CatchupFailure> {
        match response {
            CatchupResponse::FileHeader(header) => {
                self.streams
                    .create(&header.file_name)
                    .await
                    .map_err(CatchupFailure::Sink)?;
                self.current = Some((header.file_name, header.required_alignment));
                Ok(None)
            }
            CatchupResponse::FileChunk(chunk) => {
                let (file_name, alignment) = match &self.current {
                    Some(current) => current,
                    None => return Err(CatchupFailure::UnexpectedResponse(ResponseMessageType::FileChunk)),
                };
                if !chunk.is_empty() {
                    self.streams
                        .write(file_name, *alignment, chunk.into_bytes())
                        .await
                        .map_err(CatchupFailure::Sink)?;
                }
                Ok(None)
            }
            CatchupResponse::StoreCopyFinished(finished) => Ok(Some(finished)),
            other => Err(CatchupFailure::UnexpectedResponse(other.message_type())),
        }
    }
}

/// Hands every pulled transaction to the listener until the stream finishes.
pub(crate) struct TxPullHandler {
    listener: Arc<dyn TxPullResponseListener>,
}

impl TxPullHandler {
    pub(crate) fn new(listener: Arc<dyn TxPullResponseListener>) -> Self {
        TxPullHandler { listener }
    }
}

#[async_trait::async_trait]
impl ResponseHandler for TxPullHandler {
    type Output = TxStreamFinishedResponse;

    async fn on_response(
        &mut self,
        response: CatchupResponse,
    ) -> Result<Option<TxStreamFinishedResponse>, CatchupFailure> {
        match response {
            CatchupResponse::TxPull(tx) => {
                self.listener.on_tx_received(tx);
                Ok(None)
            }
            CatchupResponse::TxStreamFinished(finished) => Ok(Some(finished)),
            other => Err(CatchupFailure::UnexpectedResponse(other.message_type())),
        }
    }
}
