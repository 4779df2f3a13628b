use bytes::Bytes;
use std::fmt;

/// FileChunk is one piece of a streamed store file. The bytes are a view into the buffer the
/// chunk was received in; nothing is copied until the consumer decides to.
#[derive(Clone, Eq, PartialEq)]
pub struct FileChunk {
    bytes: Bytes,
    last: bool,
}

impl FileChunk {
    pub fn new(bytes: Bytes, last: bool) -> Self {
        FileChunk { bytes, last }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether this is the final chunk of its file.
    pub fn is_last(&self) -> bool {
        self.last
    }

    /// Hands the underlying buffer over to the consumer. The receive buffer region is released
    /// once the returned `Bytes` and all its clones are dropped.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl fmt::Debug for FileChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileChunk")
            .field("len", &self.bytes.len())
            .field("last", &self.last)
            .finish()
    }
}
