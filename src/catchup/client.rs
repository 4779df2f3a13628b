use crate::catchup::error::CatchupClientError;
use crate::catchup::handler::{ResponseHandler, SingleResponse, StoreFileHandler, TxPullHandler};
use crate::catchup::interrupt::Interrupter;
use crate::catchup::messages::{
    CatchupRequest, CatchupResponse, GetStoreFileRequest, PrepareStoreCopyRequest, PrepareStoreCopyResponse,
    StoreCopyFinishedResponse, TxPullRequest, TxStreamFinishedResponse,
};
use crate::catchup::pending::{PendingResponse, ResponseActivity};
use crate::catchup::storecopy::StoreFileStreams;
use crate::catchup::timeout_loop::wait_for_completion;
use crate::catchup::tx_pull::TxPullResponseListener;
use crate::identity::StoreId;
use crate::messaging::{AdvertisedSocketAddress, ChannelSettings, ReconnectingChannel, ReconnectingChannels};
use crate::protocol::ProtocolStack;
use crate::state_machine::CoreSnapshot;
use crate::time::{Clock, RealClock};
use std::sync::Arc;
use tokio::time::Duration;

/// CatchupClient makes catchup requests to other members. Each request goes over the registry's
/// channel for its address and is given up on once the remote stops making progress for longer
/// than the inactivity timeout.
pub struct CatchupClient<C: Clock = RealClock> {
    logger: slog::Logger,
    channels: ReconnectingChannels,
    settings: ChannelSettings,
    inactivity_timeout: Duration,
    clock: C,
    interrupter: Interrupter,
}

impl<C: Clock> CatchupClient<C> {
    pub fn new(logger: slog::Logger, settings: ChannelSettings, inactivity_timeout: Duration, clock: C) -> Self {
        CatchupClient {
            logger,
            channels: ReconnectingChannels::new(),
            settings,
            inactivity_timeout,
            clock,
            interrupter: Interrupter::new(),
        }
    }

    /// Interrupting fails every request currently waiting, and every new one until reset.
    pub fn interrupter(&self) -> &Interrupter {
        &self.interrupter
    }

    pub fn installed_protocols(&self) -> Vec<(AdvertisedSocketAddress, ProtocolStack)> {
        self.channels.installed_protocols()
    }

    /// Drops the channel to `address`, closing its connection once no request is using it.
    pub async fn forget(&self, address: &AdvertisedSocketAddress) {
        if let Some(channel) = self.channels.remove(address) {
            channel.dispose().await;
        }
    }

    pub async fn get_store_id(&self, from: &AdvertisedSocketAddress) -> Result<StoreId, CatchupClientError> {
        let handler = SingleResponse::<StoreId>::new(|response| match response {
            CatchupResponse::StoreId(store_id) => Ok(store_id),
            other => Err(other),
        });
        self.make_request(from, CatchupRequest::GetStoreId, handler, "get store id")
            .await
    }

    pub async fn get_core_snapshot(&self, from: &AdvertisedSocketAddress) -> Result<CoreSnapshot, CatchupClientError> {
        let handler = SingleResponse::<CoreSnapshot>::new(|response| match response {
            CatchupResponse::CoreSnapshot(snapshot) => Ok(snapshot),
            other => Err(other),
        });
        self.make_request(from, CatchupRequest::CoreSnapshot, handler, "get core snapshot")
            .await
    }

    pub async fn prepare_store_copy(
        &self,
        from: &AdvertisedSocketAddress,
        expected_store_id: StoreId,
    ) -> Result<PrepareStoreCopyResponse, CatchupClientError> {
        let handler = SingleResponse::<PrepareStoreCopyResponse>::new(|response| match response {
            CatchupResponse::PrepareStoreCopy(prepared) => Ok(prepared),
            other => Err(other),
        });
        let request = CatchupRequest::PrepareStoreCopy(PrepareStoreCopyRequest::new(expected_store_id));
        self.make_request(from, request, handler, "prepare store copy").await
    }

    /// Streams one store file into `streams`.
    pub async fn get_store_file(
        &self,
        from: &AdvertisedSocketAddress,
        expected_store_id: StoreId,
        file_name: &str,
        required_tx_id: i64,
        streams: Arc<dyn StoreFileStreams>,
    ) -> Result<StoreCopyFinishedResponse, CatchupClientError> {
        let request = CatchupRequest::GetStoreFile(GetStoreFileRequest {
            store_id: expected_store_id,
            file_name: file_name.to_string(),
            required_tx_id,
        });
        let operation = format!("get store file '{}'", file_name);
        self.make_request(from, request, StoreFileHandler::new(streams), &operation)
            .await
    }

    /// Streams every transaction after `previous_tx_id` into `listener`.
    pub async fn pull_transactions(
        &self,
        from: &AdvertisedSocketAddress,
        store_id: StoreId,
        previous_tx_id: i64,
        listener: Arc<dyn TxPullResponseListener>,
    ) -> Result<TxStreamFinishedResponse, CatchupClientError> {
        let request = CatchupRequest::TxPull(TxPullRequest {
            store_id,
            previous_tx_id,
        });
        self.make_request(from, request, TxPullHandler::new(listener), "pull transactions")
            .await
    }

    fn channel_for(&self, address: &AdvertisedSocketAddress) -> Arc<ReconnectingChannel> {
        if let Some(channel) = self.channels.get(address) {
            return channel;
        }

        let channel = Arc::new(ReconnectingChannel::new(
            self.logger.clone(),
            address.clone(),
            self.settings.clone(),
        ));
        match self.channels.put_if_absent(address.clone(), channel.clone()) {
            Some(existing) => existing,
            None => channel,
        }
    }

    async fn make_request<H: ResponseHandler>(
        &self,
        to: &AdvertisedSocketAddress,
        request: CatchupRequest,
        handler: H,
        operation: &str,
    ) -> Result<H::Output, CatchupClientError> {
        let operation = format!("{} from {}", operation, to);
        let channel = self.channel_for(to);
        let activity = ResponseActivity::new(self.clock.clone());

        let recorder = activity.clone();
        let pending = PendingResponse::spawn(async move {
            channel
                .exchange(request, handler, move || recorder.record())
                .await
        });

        let mut interrupt = self.interrupter.listener();
        wait_for_completion(
            pending,
            &operation,
            || activity.time_since_last_response(),
            self.inactivity_timeout,
            self.clock.clone(),
            &mut interrupt,
            &self.logger,
        )
        .await
    }
}
