use bytes::{Bytes, BytesMut};
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// StoreFileStreams is where copied store files end up. `create` starts (or restarts) a file,
/// `write` appends to it.
#[async_trait::async_trait]
pub trait StoreFileStreams: Send + Sync {
    async fn create(&self, file_name: &str) -> io::Result<()>;
    async fn write(&self, file_name: &str, required_alignment: i32, data: Bytes) -> io::Result<()>;
}

#[derive(Default)]
pub struct InMemoryStoreFileStreams {
    files: Mutex<BTreeMap<String, BytesMut>>,
}

impl InMemoryStoreFileStreams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(&self, file_name: &str) -> Option<Bytes> {
        self.files
            .lock()
            .expect("InMemoryStoreFileStreams.file() mutex guard poison")
            .get(file_name)
            .map(|content| Bytes::copy_from_slice(content))
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files
            .lock()
            .expect("InMemoryStoreFileStreams.file_names() mutex guard poison")
            .keys()
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl StoreFileStreams for InMemoryStoreFileStreams {
    async fn create(&self, file_name: &str) -> io::Result<()> {
        self.files
            .lock()
            .expect("InMemoryStoreFileStreams.create() mutex guard poison")
            .insert(file_name.to_string(), BytesMut::new());
        Ok(())
    }

    async fn write(&self, file_name: &str, _: i32, data: Bytes) -> io::Result<()> {
        let mut files = self
            .files
            .lock()
            .expect("InMemoryStoreFileStreams.write() mutex guard poison");
        match files.get_mut(file_name) {
            Some(content) => {
                content.extend_from_slice(&data);
                Ok(())
            }
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("File '{}' was never created", file_name),
            )),
        }
    }
}

/// Writes copied files into a directory. File names must be plain relative paths that stay
/// inside it.
pub struct DirectoryStoreFileStreams {
    directory: PathBuf,
}

impl DirectoryStoreFileStreams {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        DirectoryStoreFileStreams {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_of(&self, file_name: &str) -> io::Result<PathBuf> {
        let relative = Path::new(file_name);
        let is_plain = relative.components().all(|c| matches!(c, Component::Normal(_)));
        if file_name.is_empty() || !is_plain {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Refusing to write store file '{}'", file_name),
            ));
        }
        Ok(self.directory.join(relative))
    }
}

#[async_trait::async_trait]
impl StoreFileStreams for DirectoryStoreFileStreams {
    async fn create(&self, file_name: &str) -> io::Result<()> {
        let path = self.path_of(file_name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        File::create(&path).await?;
        Ok(())
    }

    async fn write(&self, file_name: &str, _: i32, data: Bytes) -> io::Result<()> {
        let path = self.path_of(file_name)?;
        let mut file = OpenOptions::new().append(true).open(&path).await?;
        file.write_all(&data).await?;
        file.flush().await
    }
}
