//! The advisory lock.
//!
//! A plain file created with exclusive semantics next to the scanned
//! entries. Presence alone is the signal; the pid and start timestamp
//! inside are for human inspection after abnormal termination.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use retentions_core::{RetentionError, LOCK_FILE_NAME};

/// Scoped lock on a base directory; released on drop on all exit paths.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    /// Create `<base>/.retentions.lock`, failing with the concurrency error
    /// if it already exists.
    pub fn acquire(base: &Path) -> Result<Self, RetentionError> {
        let path = base.join(LOCK_FILE_NAME);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(RetentionError::Concurrency { path });
            }
            Err(err) => return Err(RetentionError::io(&path, err)),
        };

        // Construct the guard first so a failed write still unlinks.
        let guard = Self { path };
        writeln!(file, "{} {}", std::process::id(), Local::now().to_rfc3339())
            .map_err(|err| RetentionError::io(&guard.path, err))?;
        Ok(guard)
    }

    /// The lock file's path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // Nothing useful to do if the unlink fails; the stale lock is
        // visible to the operator either way.
        let _ = fs::remove_file(&self.path);
    }
}
