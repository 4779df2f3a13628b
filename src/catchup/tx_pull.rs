use crate::catchup::messages::TxPullResponse;
use std::sync::Mutex;

/// TxPullResponseListener receives pulled transactions in commit order.
pub trait TxPullResponseListener: Send + Sync {
    fn on_tx_received(&self, response: TxPullResponse);
}

/// Keeps every received transaction in memory.
#[derive(Default)]
pub struct CollectingTxListener {
    received: Mutex<Vec<TxPullResponse>>,
}

impl CollectingTxListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<TxPullResponse> {
        self.received
            .lock()
            .expect("CollectingTxListener.received() mutex guard poison")
            .clone()
    }

    pub fn last_tx_id(&self) -> Option<i64> {
        self.received
            .lock()
            .expect("CollectingTxListener.last_tx_id() mutex guard poison")
            .last()
            .map(|r| r.tx().tx_id)
    }
}

impl TxPullResponseListener for CollectingTxListener {
    fn on_tx_received(&self, response: TxPullResponse) {
        self.received
            .lock()
            .expect("CollectingTxListener.on_tx_received() mutex guard poison")
            .push(response);
    }
}
