//! Exclusive advisory file locks
//!
//! Several processes may share one data directory (the CLI, a webhook
//! listener). Writers take an exclusive lock on a lock file next to the
//! ledger before reading the document, so no process writes over another's
//! committed changes. Locks are released when the guard drops.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;

use crate::error::{LedgerError, LedgerResult};

/// Held exclusive lock on a file
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Block until the lock on `path` is acquired, creating the file if needed
    pub fn acquire(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| LedgerError::Io(format!("Failed to create lock directory: {}", e)))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|e| LedgerError::Io(format!("Failed to open lock file {}: {}", path.display(), e)))?;

        file.lock_exclusive()
            .map_err(|e| LedgerError::Storage(format!("Failed to lock {}: {}", path.display(), e)))?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to release file lock");
        }
    }
}
