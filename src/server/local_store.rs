use crate::catchup::CommittedTransaction;
use crate::identity::StoreId;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::io::AsyncRead;

/// Id of the last transaction of a freshly created store. Real transactions come after it.
pub const BASE_TX_ID: i64 = 1;

pub struct StoreFile {
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    pub required_alignment: i32,
}

/// LocalStore is the storage engine as seen by the catchup server. Its contents are opaque
/// bytes here.
#[async_trait::async_trait]
pub trait LocalStore: Send + Sync + 'static {
    fn store_id(&self) -> StoreId;

    /// Whether the database is currently able to serve transactions.
    fn is_available(&self) -> bool;

    fn last_committed_tx_id(&self) -> i64;

    /// Oldest transaction still retained. Anything before it has been pruned.
    fn first_available_tx_id(&self) -> i64;

    fn list_store_files(&self) -> io::Result<Vec<String>>;

    /// `None` if there is no such file.
    async fn open_store_file(&self, file_name: &str) -> io::Result<Option<StoreFile>>;

    /// Every retained transaction with an id greater than `tx_id`, in commit order.
    fn transactions_after(&self, tx_id: i64) -> io::Result<Vec<CommittedTransaction>>;
}

/// An in-memory store for tests and embedding.
pub struct InMemoryLocalStore {
    store_id: StoreId,
    available: AtomicBool,
    state: Mutex<InMemoryState>,
}

struct InMemoryState {
    files: BTreeMap<String, Bytes>,
    transactions: Vec<CommittedTransaction>,
    last_committed_tx_id: i64,
}

impl InMemoryLocalStore {
    pub fn new(store_id: StoreId) -> Self {
        InMemoryLocalStore {
            store_id,
            available: AtomicBool::new(true),
            state: Mutex::new(InMemoryState {
                files: BTreeMap::new(),
                transactions: vec![],
                last_committed_tx_id: BASE_TX_ID,
            }),
        }
    }

    pub fn put_file(&self, file_name: impl Into<String>, content: impl Into<Bytes>) {
        self.lock_state().files.insert(file_name.into(), content.into());
    }

    /// Commits a transaction and returns its id.
    pub fn commit(&self, payload: impl Into<Bytes>) -> i64 {
        let mut state = self.lock_state();
        let tx_id = state.last_committed_tx_id + 1;
        state.transactions.push(CommittedTransaction {
            tx_id,
            payload: payload.into(),
        });
        state.last_committed_tx_id = tx_id;
        tx_id
    }

    /// Forgets every transaction up to and including `tx_id`.
    pub fn prune_up_to(&self, tx_id: i64) {
        self.lock_state().transactions.retain(|tx| tx.tx_id > tx_id);
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, InMemoryState> {
        self.state.lock().expect("InMemoryLocalStore mutex guard poison")
    }
}

#[async_trait::async_trait]
impl LocalStore for InMemoryLocalStore {
    fn store_id(&self) -> StoreId {
        self.store_id
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    fn last_committed_tx_id(&self) -> i64 {
        self.lock_state().last_committed_tx_id
    }

    fn first_available_tx_id(&self) -> i64 {
        let state = self.lock_state();
        match state.transactions.first() {
            Some(tx) => tx.tx_id,
            None => state.last_committed_tx_id + 1,
        }
    }

    fn list_store_files(&self) -> io::Result<Vec<String>> {
        Ok(self.lock_state().files.keys().cloned().collect())
    }

    async fn open_store_file(&self, file_name: &str) -> io::Result<Option<StoreFile>> {
        let content = self.lock_state().files.get(file_name).cloned();
        Ok(content.map(|content| StoreFile {
            reader: Box::new(io::Cursor::new(content)),
            required_alignment: 0,
        }))
    }

    fn transactions_after(&self, tx_id: i64) -> io::Result<Vec<CommittedTransaction>> {
        Ok(self
            .lock_state()
            .transactions
            .iter()
            .filter(|tx| tx.tx_id > tx_id)
            .cloned()
            .collect())
    }
}
