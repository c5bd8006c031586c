//! File-backed build sink for persistent indexes.

use crate::error::{StorageError, StorageResult};
use crate::sink::IndexSink;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Options controlling how a [`FileSink`] opens and seals its target.
#[derive(Debug, Clone, Copy)]
pub struct FileSinkOptions {
    /// Create missing parent directories.
    pub create_dirs: bool,
    /// Call `sync_all` when sealing.
    pub sync_on_seal: bool,
    /// Hold an exclusive advisory lock for the target while writing.
    pub lock: bool,
}

impl Default for FileSinkOptions {
    fn default() -> Self {
        Self {
            create_dirs: false,
            sync_on_seal: true,
            lock: true,
        }
    }
}

impl FileSinkOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create missing parent directories.
    #[must_use]
    pub const fn create_dirs(mut self, value: bool) -> Self {
        self.create_dirs = value;
        self
    }

    /// Sets whether to sync the file when sealing.
    #[must_use]
    pub const fn sync_on_seal(mut self, value: bool) -> Self {
        self.sync_on_seal = value;
        self
    }

    /// Sets whether to lock the target while writing.
    #[must_use]
    pub const fn lock(mut self, value: bool) -> Self {
        self.lock = value;
        self
    }
}

/// A file-based build sink.
///
/// Bytes are buffered and streamed into a temporary file next to the
/// target, so memory use stays bounded no matter how large the index grows.
/// Sealing renames the temporary file over the target in one step: readers
/// that already opened or mapped the old index keep seeing it unchanged,
/// and a sink dropped before sealing leaves the target untouched.
///
/// # Exclusivity
///
/// Unless disabled, the sink takes an exclusive advisory lock on a sidecar
/// `<target>.lock` file and holds it until sealed or dropped. A second sink
/// on the same path fails with [`StorageError::Locked`].
///
/// # Durability
///
/// - `seal()` flushes the buffer to the OS
/// - with `sync_on_seal`, it also calls `File::sync_all()` before the rename
///
/// # Example
///
/// ```no_run
/// use ordex_storage::{FileSink, FileSinkOptions, IndexSink};
/// use std::io::Write;
/// use std::path::Path;
///
/// let mut sink = FileSink::create(Path::new("words.fst"), FileSinkOptions::new()).unwrap();
/// sink.write_all(b"persistent data").unwrap();
/// let path = sink.seal().unwrap();
/// ```
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<NamedTempFile>,
    written: u64,
    options: FileSinkOptions,
    lock: Option<TargetLock>,
}

impl FileSink {
    /// Opens a sink that will replace the file at `path` when sealed.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory is missing (and
    /// `create_dirs` is off), the temporary file cannot be created, or
    /// another writer holds the lock.
    pub fn create(path: &Path, options: FileSinkOptions) -> StorageResult<Self> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if options.create_dirs {
            std::fs::create_dir_all(parent)?;
        }

        let lock = if options.lock {
            Some(TargetLock::acquire(path)?)
        } else {
            None
        };
        let staging = tempfile::Builder::new()
            .prefix(".ordex-")
            .suffix(".tmp")
            .tempfile_in(parent)?;

        tracing::debug!(
            path = %path.display(),
            staging = %staging.path().display(),
            lock = options.lock,
            "created file sink"
        );
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(staging),
            written: 0,
            options,
            lock,
        })
    }

    /// Returns the path to the target file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.writer.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl IndexSink for FileSink {
    type Output = PathBuf;

    fn seal(self) -> StorageResult<PathBuf> {
        let Self {
            path,
            writer,
            written,
            options,
            lock,
        } = self;

        let staging = writer.into_inner().map_err(|err| err.into_error())?;
        if options.sync_on_seal {
            staging.as_file().sync_all()?;
        }
        staging.persist(&path).map_err(|err| StorageError::Io(err.error))?;
        drop(lock);

        tracing::debug!(path = %path.display(), written, "sealed file sink");
        Ok(path)
    }

    fn written(&self) -> u64 {
        self.written
    }
}

/// Exclusive advisory lock on the sidecar file of a build target.
#[derive(Debug)]
struct TargetLock {
    path: PathBuf,
    file: File,
}

impl TargetLock {
    fn acquire(target: &Path) -> StorageResult<Self> {
        let mut name = target
            .file_name()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "build target has no file name")
            })?
            .to_os_string();
        name.push(".lock");
        let path = target.with_file_name(name);

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        file.try_lock_exclusive().map_err(|err| {
            if err.kind() == fs2::lock_contended_error().kind() {
                StorageError::Locked {
                    path: target.to_path_buf(),
                }
            } else {
                StorageError::Io(err)
            }
        })?;
        Ok(Self { path, file })
    }
}

impl Drop for TargetLock {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to remove lock file");
        }
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to release lock");
        }
    }
}
