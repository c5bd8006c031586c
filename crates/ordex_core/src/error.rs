//! Error types for ordex core.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in ordex core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Builder input was not strictly increasing.
    #[error("key {got:?} inserted out of order (previous key {previous:?})")]
    OutOfOrder {
        /// The last key accepted by the builder.
        previous: String,
        /// The rejected key.
        got: String,
    },

    /// A builder was used after `finish` (or after a fatal write error).
    #[error("builder already finished")]
    BuilderSpent,

    /// I/O error from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A persisted index could not be decoded.
    #[error("corrupt index: {message}")]
    CorruptIndex {
        /// Description of the corruption.
        message: String,
    },

    /// Map lookup for an absent key.
    #[error("key '{key}' not in map")]
    KeyNotFound {
        /// The missing key.
        key: String,
    },

    /// Range bounds are inverted.
    #[error("invalid range: start {start:?} is greater than end {end:?}")]
    InvalidRange {
        /// Lower bound of the range.
        start: String,
        /// Upper bound of the range.
        end: String,
    },

    /// The fuzzy matcher would exceed its distance or state ceiling.
    #[error("automaton too large: {message}")]
    AutomatonTooLarge {
        /// Description from the automaton builder.
        message: String,
    },

    /// Pattern is invalid or uses unsupported syntax.
    #[error("pattern error: {message}")]
    Pattern {
        /// Description of the problem.
        message: String,
    },
}

/// Identifying tag of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`CoreError::OutOfOrder`].
    OutOfOrder,
    /// See [`CoreError::BuilderSpent`].
    BuilderSpent,
    /// See [`CoreError::Io`].
    Io,
    /// See [`CoreError::CorruptIndex`].
    CorruptIndex,
    /// See [`CoreError::KeyNotFound`].
    KeyNotFound,
    /// See [`CoreError::InvalidRange`].
    InvalidRange,
    /// See [`CoreError::AutomatonTooLarge`].
    AutomatonTooLarge,
    /// See [`CoreError::Pattern`].
    Pattern,
}

impl ErrorKind {
    /// Returns a stable name for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OutOfOrder => "OutOfOrderError",
            Self::BuilderSpent => "BuilderSpentError",
            Self::Io => "IoError",
            Self::CorruptIndex => "CorruptIndexError",
            Self::KeyNotFound => "KeyNotFoundError",
            Self::InvalidRange => "InvalidRangeError",
            Self::AutomatonTooLarge => "AutomatonTooLargeError",
            Self::Pattern => "PatternError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CoreError {
    /// Returns the identifying kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OutOfOrder { .. } => ErrorKind::OutOfOrder,
            Self::BuilderSpent => ErrorKind::BuilderSpent,
            Self::Io(_) => ErrorKind::Io,
            Self::CorruptIndex { .. } => ErrorKind::CorruptIndex,
            Self::KeyNotFound { .. } => ErrorKind::KeyNotFound,
            Self::InvalidRange { .. } => ErrorKind::InvalidRange,
            Self::AutomatonTooLarge { .. } => ErrorKind::AutomatonTooLarge,
            Self::Pattern { .. } => ErrorKind::Pattern,
        }
    }

    /// Creates a corrupt index error.
    pub fn corrupt_index(message: impl Into<String>) -> Self {
        Self::CorruptIndex {
            message: message.into(),
        }
    }

    /// Creates a pattern error.
    pub fn pattern(message: impl Into<String>) -> Self {
        Self::Pattern {
            message: message.into(),
        }
    }

    /// Creates a key not found error.
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }
}

impl From<ordex_storage::StorageError> for CoreError {
    fn from(err: ordex_storage::StorageError) -> Self {
        Self::Io(err.into_io())
    }
}

impl From<fst::Error> for CoreError {
    fn from(err: fst::Error) -> Self {
        match err {
            fst::Error::Io(err) => Self::Io(err),
            fst::Error::Fst(err) => match err {
                fst::raw::Error::OutOfOrder { previous, got } => Self::OutOfOrder {
                    previous: lossy(&previous),
                    got: lossy(&got),
                },
                fst::raw::Error::DuplicateKey { got } => Self::OutOfOrder {
                    previous: lossy(&got),
                    got: lossy(&got),
                },
                other => Self::corrupt_index(other.to_string()),
            },
        }
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
