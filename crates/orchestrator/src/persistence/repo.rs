#![forbid(unsafe_code)]

use crate::error::Error;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;

/// Durable home of the serialized store document.
#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Read the stored bytes; `None` when nothing was stored yet.
    async fn load(&self) -> Result<Option<Vec<u8>>, Error>;
    /// Replace the stored bytes.
    async fn persist(&self, bytes: &[u8]) -> Result<(), Error>;
}

#[derive(Debug, Default)]
pub struct NoopRepository;

#[async_trait]
impl StateRepository for NoopRepository {
    async fn load(&self) -> Result<Option<Vec<u8>>, Error> {
        Ok(None)
    }

    async fn persist(&self, _bytes: &[u8]) -> Result<(), Error> {
        Ok(())
    }
}

/// Stores the document in a single JSON file.
///
/// Writes go to a sibling temporary file that is renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        if path.file_name().is_none() {
            return Err(Error::InvalidPath(path));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StateRepository for JsonFileRepository {
    async fn load(&self) -> Result<Option<Vec<u8>>, Error> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn persist(&self, bytes: &[u8]) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "state persisted");
        Ok(())
    }
}

/// In-memory repository. Clones share the same contents, and writes can be
/// made to fail on demand.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    inner: Arc<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    bytes: Mutex<Option<Vec<u8>>>,
    failing: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(bytes: impl Into<Vec<u8>>) -> Self {
        let repo = Self::default();
        *repo.inner.bytes.lock() = Some(bytes.into());
        repo
    }

    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        self.inner.bytes.lock().clone()
    }

    /// Number of successful writes.
    pub fn writes(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateRepository for MemoryRepository {
    async fn load(&self) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.contents())
    }

    async fn persist(&self, bytes: &[u8]) -> Result<(), Error> {
        if self.inner.failing.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::other("write refused")));
        }
        *self.inner.bytes.lock() = Some(bytes.to_vec());
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
