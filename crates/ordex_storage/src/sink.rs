//! Build sink trait definition.

use crate::error::StorageResult;
use std::io;

/// A write-once destination for an encoded index.
///
/// Sinks are **opaque byte writers**. The index encoder streams bytes into
/// them through [`io::Write`] and, when the encoding is complete, seals the
/// sink exactly once to obtain whatever the sink produces (an in-memory
/// buffer, or the path of a durable file).
///
/// # Invariants
///
/// - Bytes are written strictly in order; there is no seeking back
/// - `seal` consumes the sink, so a sealed sink cannot be written again
/// - After `seal` returns `Ok`, every written byte is visible to readers
///
/// # Implementors
///
/// - [`super::MemorySink`] - For in-memory indexes
/// - [`super::FileSink`] - For persistent indexes
pub trait IndexSink: io::Write + Send {
    /// What sealing produces.
    type Output;

    /// Flushes all pending bytes and returns the finished output.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush or sync fails.
    fn seal(self) -> StorageResult<Self::Output>;

    /// Returns the number of bytes written so far.
    fn written(&self) -> u64;
}
