//! Error taxonomy for the retention pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can abort a retention run.
///
/// Each variant maps to exactly one process exit code; see
/// [`RetentionError::exit_code`].
#[derive(Debug, Error)]
pub enum RetentionError {
    /// Invalid or conflicting configuration.
    #[error("{message}")]
    Config { message: String },

    /// I/O failure against the filesystem.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another run holds the lock on the base directory.
    #[error("Lock file already present: {}", .path.display())]
    Concurrency { path: PathBuf },

    /// The keep/prune partition is inconsistent.
    #[error("Integrity check failed: {message}")]
    Integrity { message: String },

    /// Anything else; indicates a programming fault.
    #[error("Unexpected error: {message}")]
    Unexpected { message: String },
}

impl RetentionError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an integrity error.
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }

    /// The process exit code for this error class.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io { .. } => 1,
            Self::Config { .. } => 2,
            Self::Concurrency { .. } => 5,
            Self::Integrity { .. } => 7,
            Self::Unexpected { .. } => 9,
        }
    }
}
