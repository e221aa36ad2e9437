//! Advisory lock on a checkpoint store
//!
//! Two crawls writing the same directory would race on the same month files.
//! Holding the write guard of a [`StoreLock`] for the whole run keeps a second
//! process out until the first exits.

use super::{StoreError, StoreResult};
use fd_lock::{RwLock, RwLockWriteGuard};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Lock file name inside the store directory
pub const LOCK_FILE_NAME: &str = ".crawl.lock";

/// Lock file handle for one store directory
pub struct StoreLock {
    lock: RwLock<File>,
    path: PathBuf,
}

impl StoreLock {
    /// Open (or create) the lock file inside `store_dir`
    pub fn open(store_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(store_dir).map_err(|e| StoreError::IoError(e.to_string()))?;

        let path = store_dir.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StoreError::LockError(format!("Failed to open lock file: {e}")))?;

        Ok(Self {
            lock: RwLock::new(file),
            path,
        })
    }

    /// Take the exclusive lock without blocking
    ///
    /// The lock is held for as long as the returned guard lives. Fails
    /// immediately if another handle holds it.
    pub fn try_exclusive(&mut self) -> StoreResult<RwLockWriteGuard<'_, File>> {
        let guard = self.lock.try_write().map_err(|e| {
            StoreError::LockError(format!(
                "Store {} is locked by another crawl: {e}",
                self.path.display()
            ))
        })?;

        debug!(path = %self.path.display(), "Store lock acquired");
        Ok(guard)
    }

    /// Lock file location
    pub fn path(&self) -> &Path {
        &self.path
    }
}
