use crate::catchup::client::CatchupClient;
use crate::catchup::error::CatchupClientError;
use crate::catchup::messages::TxStreamStatus;
use crate::catchup::storecopy::{StoreCopyClient, StoreCopyFailed, StoreFileStreams, TerminationCondition};
use crate::catchup::tx_pull::TxPullResponseListener;
use crate::discovery::TopologyService;
use crate::identity::{MemberId, StoreId};
use crate::state_machine::CoreSnapshotService;
use crate::time::{Clock, RealClock};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("No catchup address known for member {0}")]
    MemberUnreachable(MemberId),
    #[error("Local store {local} does not match remote store {remote}")]
    StoreIdMismatch { local: StoreId, remote: StoreId },
    #[error(transparent)]
    Catchup(#[from] CatchupClientError),
    #[error("Store copy failed: {0}")]
    StoreCopy(#[from] StoreCopyFailed),
    #[error("Pulling transactions failed with status {0:?}")]
    TxPull(TxStreamStatus),
}

/// The member-local side of a download.
pub struct DownloadTarget {
    /// `None` for an empty store, which will be replaced by a copy of the remote one.
    pub store_id: Option<StoreId>,
    /// Where to pull transactions from when the store is not empty.
    pub last_committed_tx_id: i64,
    pub streams: Arc<dyn StoreFileStreams>,
    pub tx_listener: Arc<dyn TxPullResponseListener>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DownloadOutcome {
    pub store_id: StoreId,
    pub store_copied: bool,
    pub last_tx_id: i64,
}

/// CoreStateDownloader brings a member's core state up to date with another member's: the core
/// snapshot, and the store underneath it.
pub struct CoreStateDownloader<C: Clock = RealClock> {
    logger: slog::Logger,
    catchup: Arc<CatchupClient<C>>,
    store_copy: StoreCopyClient<C>,
    topology: Arc<dyn TopologyService>,
}

impl<C: Clock> CoreStateDownloader<C> {
    pub fn new(
        logger: slog::Logger,
        catchup: Arc<CatchupClient<C>>,
        store_copy: StoreCopyClient<C>,
        topology: Arc<dyn TopologyService>,
    ) -> Self {
        CoreStateDownloader {
            logger,
            catchup,
            store_copy,
            topology,
        }
    }

    /// Downloads from `from` into `target`, then installs the downloaded snapshot into
    /// `core_state`. The snapshot is fetched before the store so that the store, once caught up,
    /// is at least as recent as the snapshot.
    pub async fn download_snapshot(
        &self,
        from: &MemberId,
        target: &DownloadTarget,
        core_state: &dyn CoreSnapshotService,
        termination: &dyn TerminationCondition,
    ) -> Result<DownloadOutcome, DownloadError> {
        let address = self
            .topology
            .find_catchup_address(from)
            .ok_or_else(|| DownloadError::MemberUnreachable(from.clone()))?;

        let remote_store_id = self.catchup.get_store_id(&address).await?;
        if let Some(local_store_id) = target.store_id {
            if local_store_id != remote_store_id {
                return Err(DownloadError::StoreIdMismatch {
                    local: local_store_id,
                    remote: remote_store_id,
                });
            }
        }

        let snapshot = self.catchup.get_core_snapshot(&address).await?;
        slog::info!(
            self.logger,
            "Downloaded core snapshot from {} at index {:?}",
            from,
            snapshot.prev_index()
        );

        let (store_copied, pull_from) = match target.store_id {
            Some(_) => (false, target.last_committed_tx_id),
            None => {
                slog::info!(self.logger, "Local store is empty, copying store from {}", from);
                let copied_up_to = self
                    .store_copy
                    .copy_store_files(&address, remote_store_id, target.streams.clone(), termination)
                    .await?;
                (true, copied_up_to)
            }
        };

        let finished = self
            .catchup
            .pull_transactions(&address, remote_store_id, pull_from, target.tx_listener.clone())
            .await?;
        if finished.status != TxStreamStatus::SuccessEndOfStream {
            return Err(DownloadError::TxPull(finished.status));
        }

        core_state.install_snapshot(snapshot);
        slog::info!(
            self.logger,
            "Core state downloaded from {}, store at transaction {}",
            from,
            finished.latest_tx_id
        );

        Ok(DownloadOutcome {
            store_id: remote_store_id,
            store_copied,
            last_tx_id: finished.latest_tx_id,
        })
    }
}
