//! File-backed document store
//!
//! Documents live in a JSON snapshot. Every query reads the file, so writes
//! from other processes are seen on the next poll. Every create re-reads the
//! snapshot under an exclusive lock file and rewrites it.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::memory::{InMemoryDocumentStore, Snapshot};
use crate::ports::outbound::{DocumentStore, NewDocument, Query, StoreError, StoredDocument};

const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const LOCK_RETRY: Duration = Duration::from_millis(10);
/// A lock file older than this is left over from a crashed writer
const STALE_LOCK: Duration = Duration::from_secs(30);

pub struct FileDocumentStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileDocumentStore {
    /// Open the snapshot at `path`. A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        read_snapshot(&path).await?;

        tracing::debug!(path = %path.display(), "Opened local document store");
        Ok(Self { path, write_lock: Mutex::new(()) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<InMemoryDocumentStore, StoreError> {
        Ok(InMemoryDocumentStore::from_snapshot(read_snapshot(&self.path).await?))
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(snapshot).map_err(|e| StoreError::Malformed(e.to_string()))?;

        // Write then rename so a crash never leaves a truncated snapshot
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await.map_err(|e| io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| io_error(&self.path, e))
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn create(&self, collection: &str, document: NewDocument) -> Result<String, StoreError> {
        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| io_error(parent, e))?;
        }
        let _lock = LockFile::acquire(self.path.with_extension("lock")).await?;

        // The in-memory copy is dropped if the write fails
        let current = self.load().await?;
        let id = current.create(collection, document).await?;
        self.persist(&current.snapshot()).await?;
        Ok(id)
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<StoredDocument>, StoreError> {
        self.load().await?.query(collection, query).await
    }
}

async fn read_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Malformed(format!("{}: {}", path.display(), e))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Snapshot::new()),
        Err(e) => Err(io_error(path, e)),
    }
}

/// Exclusive writer lock shared between processes. Removed on drop.
struct LockFile {
    path: PathBuf,
}

impl LockFile {
    async fn acquire(path: PathBuf) -> Result<Self, StoreError> {
        let deadline = Instant::now() + LOCK_TIMEOUT;
        loop {
            let created = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            match created {
                Ok(_) => return Ok(Self { path }),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if is_stale(&path).await {
                        tracing::warn!(path = %path.display(), "Removing stale lock file");
                        let _ = tokio::fs::remove_file(&path).await;
                        continue;
                    }
                    if Instant::now() >= deadline {
                        return Err(StoreError::Unavailable(format!("{} is held by another writer", path.display())));
                    }
                    tokio::time::sleep(LOCK_RETRY).await;
                }
                Err(e) => return Err(io_error(&path, e)),
            }
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove lock file");
        }
    }
}

async fn is_stale(path: &Path) -> bool {
    match tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
        Ok(modified) => SystemTime::now()
            .duration_since(modified)
            .map(|age| age > STALE_LOCK)
            .unwrap_or(false),
        Err(_) => false,
    }
}

fn io_error(path: &Path, error: std::io::Error) -> StoreError {
    StoreError::Io(format!("{}: {}", path.display(), error))
}
