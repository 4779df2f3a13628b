use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// PersistentState is state that knows its own durable byte encoding.
pub trait PersistentState: Default + Sized {
    fn encode_state(&self) -> io::Result<Vec<u8>>;
    fn decode_state(bytes: &[u8]) -> io::Result<Self>;
}

/// StateStorage owns the persisted copy of a state machine's state. A storage that has never
/// been written to yields the state's default value.
pub trait StateStorage<S>: Send {
    fn initial_state(&mut self) -> io::Result<S>;
    fn persist_store_data(&mut self, state: &S) -> io::Result<()>;
}

/// InMemoryStateStorage keeps the last persisted state in memory. Clones share the same slot, so
/// a test can keep a handle and look at what was flushed.
pub struct InMemoryStateStorage<S> {
    stored: Arc<Mutex<Option<S>>>,
}

impl<S: Clone> InMemoryStateStorage<S> {
    pub fn new() -> Self {
        InMemoryStateStorage {
            stored: Arc::new(Mutex::new(None)),
        }
    }

    pub fn stored(&self) -> Option<S> {
        self.stored.lock().expect("InMemoryStateStorage mutex guard poison").clone()
    }
}

impl<S> Clone for InMemoryStateStorage<S> {
    fn clone(&self) -> Self {
        InMemoryStateStorage {
            stored: self.stored.clone(),
        }
    }
}

impl<S: Clone + Default + Send> StateStorage<S> for InMemoryStateStorage<S> {
    fn initial_state(&mut self) -> io::Result<S> {
        let stored = self.stored.lock().expect("InMemoryStateStorage mutex guard poison");
        Ok(stored.clone().unwrap_or_default())
    }

    fn persist_store_data(&mut self, state: &S) -> io::Result<()> {
        let mut stored = self.stored.lock().expect("InMemoryStateStorage mutex guard poison");
        stored.replace(state.clone());
        Ok(())
    }
}

/// DurableStateStorage keeps state in a single file. Writes go to a sibling temp file which is
/// then renamed over the real one, so a crash mid-write leaves the previous state intact.
pub struct DurableStateStorage {
    path: PathBuf,
}

impl DurableStateStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DurableStateStorage { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut file_name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        file_name.push(".tmp");
        self.path.with_file_name(file_name)
    }
}

impl<S: PersistentState> StateStorage<S> for DurableStateStorage {
    fn initial_state(&mut self) -> io::Result<S> {
        match fs::read(&self.path) {
            Ok(bytes) => S::decode_state(&bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(S::default()),
            Err(e) => Err(e),
        }
    }

    fn persist_store_data(&mut self, state: &S) -> io::Result<()> {
        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(&state.encode_state()?)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Counter(u8);

    impl PersistentState for Counter {
        fn encode_state(&self) -> io::Result<Vec<u8>> {
            Ok(vec![self.0])
        }

        fn decode_state(bytes: &[u8]) -> io::Result<Self> {
            match bytes {
                [value] => Ok(Counter(*value)),
                _ => Err(io::Error::new(io::ErrorKind::InvalidData, "expected one byte")),
            }
        }
    }

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("state-storage-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn in_memory_storage_starts_from_default() {
        let mut storage = InMemoryStateStorage::<Counter>::new();
        assert_eq!(storage.initial_state().unwrap(), Counter(0));
        assert_eq!(storage.stored(), None);

        storage.persist_store_data(&Counter(4)).unwrap();
        assert_eq!(storage.clone().initial_state().unwrap(), Counter(4));
    }

    #[test]
    fn durable_storage_survives_reopen() {
        let dir = test_dir("reopen");
        let path = dir.join("counter");

        let mut storage = DurableStateStorage::new(&path);
        let initial: Counter = storage.initial_state().unwrap();
        assert_eq!(initial, Counter(0));

        storage.persist_store_data(&Counter(7)).unwrap();
        storage.persist_store_data(&Counter(9)).unwrap();

        let mut reopened = DurableStateStorage::new(&path);
        let state: Counter = reopened.initial_state().unwrap();
        assert_eq!(state, Counter(9));
        assert!(!dir.join("counter.tmp").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn durable_storage_reports_corruption() {
        let dir = test_dir("corrupt");
        let path = dir.join("counter");
        fs::write(&path, b"not a counter").unwrap();

        let mut storage = DurableStateStorage::new(&path);
        let result: io::Result<Counter> = storage.initial_state();
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::InvalidData);

        fs::remove_dir_all(&dir).unwrap();
    }
}
