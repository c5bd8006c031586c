//! Read-only byte regions backing an opened index.

use crate::error::StorageResult;
use memmap2::Mmap;
use std::fmt;
use std::fs::File;
use std::path::Path;

/// How a persisted index is brought into the address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Memory-map the file; pages are faulted in on demand.
    #[default]
    Mmap,
    /// Read the whole file into an owned buffer.
    Read,
}

/// The immutable bytes of one index.
///
/// Either an owned buffer (built in memory, or read eagerly from disk) or a
/// read-only memory map of a file. Both variants expose the same contiguous
/// `&[u8]` view and never change after construction.
pub enum IndexBytes {
    /// In-memory owned data.
    Owned(Vec<u8>),
    /// Memory-mapped file data.
    Mapped(Mmap),
}

impl IndexBytes {
    /// Wraps an owned buffer.
    #[must_use]
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self::Owned(data)
    }

    /// Opens the file at `path` using the given mode.
    ///
    /// Empty files are always read into an (empty) owned buffer, since a
    /// zero-length mapping is not portable.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, read or mapped.
    pub fn open(path: &Path, mode: OpenMode) -> StorageResult<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();

        let bytes = match mode {
            OpenMode::Mmap if len > 0 => Self::Mapped(map_file(&file)?),
            _ => Self::Owned(std::fs::read(path)?),
        };

        tracing::debug!(path = %path.display(), ?mode, len, "opened index bytes");
        Ok(bytes)
    }

    /// Returns true if this region is a memory map.
    #[must_use]
    pub fn is_mapped(&self) -> bool {
        matches!(self, Self::Mapped(_))
    }

    /// Returns the length of the region in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_ref().len()
    }

    /// Returns true if the region is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[allow(unsafe_code)]
fn map_file(file: &File) -> StorageResult<Mmap> {
    // SAFETY: indexes are written once and never modified in place; builds
    // replace a target by renaming a new file over it, which leaves this
    // mapping on the old inode. Truncation by another process while mapped
    // is outside the supported usage.
    let mmap = unsafe { Mmap::map(file)? };
    Ok(mmap)
}

impl AsRef<[u8]> for IndexBytes {
    fn as_ref(&self) -> &[u8] {
        match self {
            Self::Owned(v) => v,
            Self::Mapped(m) => m,
        }
    }
}

impl fmt::Debug for IndexBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_mapped() { "Mapped" } else { "Owned" };
        f.debug_struct("IndexBytes")
            .field("kind", &kind)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn owned_exposes_buffer() {
        let bytes = IndexBytes::from_vec(b"abc".to_vec());
        assert!(!bytes.is_mapped());
        assert_eq!(bytes.as_ref(), b"abc");
        assert_eq!(bytes.len(), 3);
    }

    #[test]
    fn open_mapped_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.fst");
        std::fs::write(&path, b"mapped data").unwrap();

        let bytes = IndexBytes::open(&path, OpenMode::Mmap).unwrap();
        assert!(bytes.is_mapped());
        assert_eq!(bytes.as_ref(), b"mapped data");
    }

    #[test]
    fn open_read_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.fst");
        std::fs::write(&path, b"read data").unwrap();

        let bytes = IndexBytes::open(&path, OpenMode::Read).unwrap();
        assert!(!bytes.is_mapped());
        assert_eq!(bytes.as_ref(), b"read data");
    }

    #[test]
    fn open_empty_file_is_owned() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.fst");
        std::fs::write(&path, b"").unwrap();

        let bytes = IndexBytes::open(&path, OpenMode::Mmap).unwrap();
        assert!(!bytes.is_mapped());
        assert!(bytes.is_empty());
    }

    #[test]
    fn open_missing_file_fails() {
        let dir = tempdir().unwrap();
        let result = IndexBytes::open(&dir.path().join("missing.fst"), OpenMode::Mmap);
        assert!(result.is_err());
    }
}
