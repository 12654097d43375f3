//! Durable snapshot storage for the response cache
//!
//! The cache persists its entire state as a single string blob under a fixed
//! key. `SnapshotStore` abstracts where that blob lives so the cache core can
//! be tested against an in-memory store, while production uses a JSON file in
//! the XDG cache directory.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use directories::ProjectDirs;
use thiserror::Error;

/// Errors a snapshot store can report
///
/// The cache core never propagates these to its callers; it only distinguishes
/// quota exhaustion (which triggers blob deletion) from everything else.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store is out of space and cannot accept the blob
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// Any other I/O failure
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A persistent key -> string-blob mapping
///
/// Implementations must be usable from the Tokio tasks the cache spawns, so
/// the trait requires `Send + Sync`.
pub trait SnapshotStore: Send + Sync + std::fmt::Debug {
    /// Returns the blob stored under `key`, or `None` if nothing is stored.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `blob` under `key`, replacing any previous value.
    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError>;

    /// Removes the blob stored under `key`. Removing a missing key is not an
    /// error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// File-backed snapshot store
///
/// Each key maps to `<dir>/<key>.json`. The default directory is the
/// XDG-compliant cache path (`~/.cache/reeldeck/` on Linux, or the platform
/// equivalent).
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a FileStore rooted at the XDG cache directory.
    ///
    /// Returns `None` if the platform cache directory cannot be determined
    /// (e.g. no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "reeldeck")?;
        Some(Self {
            dir: project_dirs.cache_dir().to_path_buf(),
        })
    }

    /// Creates a FileStore rooted at a custom directory.
    ///
    /// Useful for testing or when a specific cache location is needed.
    #[allow(dead_code)]
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SnapshotStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(map_write_err)?;
        fs::write(self.path_for(key), blob).map_err(map_write_err)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Maps a filesystem write error, surfacing ENOSPC as quota exhaustion.
fn map_write_err(e: io::Error) -> StorageError {
    if e.kind() == io::ErrorKind::StorageFull {
        StorageError::QuotaExceeded
    } else {
        StorageError::Io(e)
    }
}

/// In-memory snapshot store for tests
///
/// Counts saves and supports one-shot failure injection so debounce
/// coalescing and quota recovery can be asserted without a filesystem.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    blobs: HashMap<String, String>,
    save_count: u64,
    fail_next_save: Option<MemoryFailure>,
}

/// Which error the next `save` call should report
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryFailure {
    Quota,
    Io,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a one-shot failure for the next `save` call.
    pub fn fail_next_save(&self, failure: MemoryFailure) {
        self.inner.lock().unwrap().fail_next_save = Some(failure);
    }

    /// Number of successful `save` calls so far.
    pub fn save_count(&self) -> u64 {
        self.inner.lock().unwrap().save_count
    }

    /// Returns the stored blob for `key`, bypassing the trait's Result.
    pub fn blob(&self, key: &str) -> Option<String> {
        self.inner.lock().unwrap().blobs.get(key).cloned()
    }

    /// Seeds a blob directly, for hydration tests.
    pub fn seed(&self, key: &str, blob: &str) {
        self.inner
            .lock()
            .unwrap()
            .blobs
            .insert(key.to_string(), blob.to_string());
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.lock().unwrap().blobs.get(key).cloned())
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(failure) = inner.fail_next_save.take() {
            return Err(match failure {
                MemoryFailure::Quota => StorageError::QuotaExceeded,
                MemoryFailure::Io => {
                    StorageError::Io(io::Error::new(io::ErrorKind::Other, "injected failure"))
                }
            });
        }
        inner.blobs.insert(key.to_string(), blob.to_string());
        inner.save_count += 1;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.lock().unwrap().blobs.remove(key);
        Ok(())
    }
}
