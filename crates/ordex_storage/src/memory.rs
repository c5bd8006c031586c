//! In-memory build sink.

use crate::error::StorageResult;
use crate::sink::IndexSink;
use std::io;

/// An in-memory build sink.
///
/// Collects the encoded index into a `Vec<u8>`. Sealing hands the buffer
/// back so it can be wrapped in [`crate::IndexBytes::Owned`].
///
/// # Example
///
/// ```rust
/// use ordex_storage::{IndexSink, MemorySink};
/// use std::io::Write;
///
/// let mut sink = MemorySink::new();
/// sink.write_all(b"test data").unwrap();
/// assert_eq!(sink.written(), 9);
/// assert_eq!(sink.seal().unwrap(), b"test data");
/// ```
#[derive(Debug, Default)]
pub struct MemorySink {
    data: Vec<u8>,
}

impl MemorySink {
    /// Creates a new empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }
}

impl io::Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl IndexSink for MemorySink {
    type Output = Vec<u8>;

    fn seal(self) -> StorageResult<Vec<u8>> {
        Ok(self.data)
    }

    fn written(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn memory_new_is_empty() {
        let sink = MemorySink::new();
        assert_eq!(sink.written(), 0);
        assert!(sink.seal().unwrap().is_empty());
    }

    #[test]
    fn memory_writes_append_in_order() {
        let mut sink = MemorySink::with_capacity(16);
        sink.write_all(b"hello").unwrap();
        sink.write_all(b" world").unwrap();

        assert_eq!(sink.written(), 11);
        assert_eq!(sink.seal().unwrap(), b"hello world");
    }

    #[test]
    fn memory_empty_write() {
        let mut sink = MemorySink::new();
        sink.write_all(b"x").unwrap();
        sink.write_all(b"").unwrap();
        assert_eq!(sink.written(), 1);
    }

    #[test]
    fn memory_flush_succeeds() {
        let mut sink = MemorySink::new();
        sink.write_all(b"data").unwrap();
        assert!(sink.flush().is_ok());
    }
}
