//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Another builder holds the lock on the target file.
    #[error("build target is locked by another writer: {}", path.display())]
    Locked {
        /// The contended file.
        path: PathBuf,
    },
}

impl StorageError {
    /// Converts this error into a plain `io::Error`, preserving the kind
    /// where one exists.
    pub fn into_io(self) -> io::Error {
        match self {
            Self::Io(err) => err,
            Self::Locked { path } => io::Error::new(
                io::ErrorKind::WouldBlock,
                format!("build target is locked by another writer: {}", path.display()),
            ),
        }
    }
}
