use crate::catchup::client::CatchupClient;
use crate::catchup::messages::{PrepareStoreCopyStatus, StoreCopyStatus};
use crate::catchup::storecopy::{MaximumTotalTime, StoreCopyFailed, StoreFileStreams, TerminationCondition};
use crate::identity::StoreId;
use crate::messaging::AdvertisedSocketAddress;
use crate::time::{Clock, RealClock};
use std::future::Future;
use std::sync::Arc;
use tokio::time::Duration;

/// StoreCopyClient copies a remote member's whole store: it asks the remote to prepare a copy,
/// then fetches every listed file. Failed steps are retried after a fixed backoff for as long as
/// the caller's termination condition allows, and never past `max_total_time`.
pub struct StoreCopyClient<C: Clock = RealClock> {
    logger: slog::Logger,
    catchup: Arc<CatchupClient<C>>,
    retry_backoff: Duration,
    max_total_time: Duration,
    clock: C,
}

impl<C: Clock> StoreCopyClient<C> {
    pub fn new(
        logger: slog::Logger,
        catchup: Arc<CatchupClient<C>>,
        retry_backoff: Duration,
        max_total_time: Duration,
        clock: C,
    ) -> Self {
        StoreCopyClient {
            logger,
            catchup,
            retry_backoff,
            max_total_time,
            clock,
        }
    }

    /// Copies every store file of `from` into `streams` and returns the id of the last
    /// transaction the copied files are guaranteed to contain.
    pub async fn copy_store_files(
        &self,
        from: &AdvertisedSocketAddress,
        expected_store_id: StoreId,
        streams: Arc<dyn StoreFileStreams>,
        termination: &dyn TerminationCondition,
    ) -> Result<i64, StoreCopyFailed> {
        let time_bound = MaximumTotalTime::new(self.max_total_time, self.clock.clone());
        let termination = &time_bound.or(termination);

        let prepared = self
            .retrying("prepare store copy", termination, move || async move {
                let response = self.catchup.prepare_store_copy(from, expected_store_id).await?;
                match response.status {
                    PrepareStoreCopyStatus::Success => Ok(response),
                    PrepareStoreCopyStatus::StoreIdMismatch => Err(StoreCopyFailed::StoreIdMismatch {
                        expected: expected_store_id,
                    }),
                    PrepareStoreCopyStatus::ListingFailed => Err(StoreCopyFailed::ListingFailed),
                }
            })
            .await?;

        let last_tx_id = prepared.last_tx_id;
        slog::info!(
            self.logger,
            "Copying {} store files from {} up to transaction {}",
            prepared.files.len(),
            from,
            last_tx_id
        );

        for file_name in &prepared.files {
            termination.assert_continue()?;
            let description = format!("copy store file '{}'", file_name);
            let streams = streams.clone();
            self.retrying(&description, termination, move || {
                self.copy_file(from, expected_store_id, file_name, last_tx_id, streams.clone())
            })
            .await?;
        }

        slog::info!(self.logger, "Finished copying store files from {}", from);
        Ok(last_tx_id)
    }

    async fn copy_file(
        &self,
        from: &AdvertisedSocketAddress,
        expected_store_id: StoreId,
        file_name: &str,
        required_tx_id: i64,
        streams: Arc<dyn StoreFileStreams>,
    ) -> Result<(), StoreCopyFailed> {
        let finished = self
            .catchup
            .get_store_file(from, expected_store_id, file_name, required_tx_id, streams)
            .await?;

        match finished.status {
            StoreCopyStatus::Success => Ok(()),
            StoreCopyStatus::StoreIdMismatch => Err(StoreCopyFailed::StoreIdMismatch {
                expected: expected_store_id,
            }),
            status => Err(StoreCopyFailed::FileCopy {
                file_name: file_name.to_string(),
                status,
            }),
        }
    }

    async fn retrying<T, F, Fut>(
        &self,
        description: &str,
        termination: &dyn TerminationCondition,
        mut attempt: F,
    ) -> Result<T, StoreCopyFailed>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreCopyFailed>>,
    {
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    slog::warn!(
                        self.logger,
                        "Failed to {}, retrying in {:?}: {}",
                        description,
                        self.retry_backoff,
                        e
                    );
                    termination.assert_continue()?;
                    self.clock.clone().sleep(self.retry_backoff).await;
                    termination.assert_continue()?;
                }
            }
        }
    }
}
