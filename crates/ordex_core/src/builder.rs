//! Write-once construction of sets and maps from sorted input.
//!
//! Builders stream entries straight into the index encoder. Keys must arrive
//! in strictly increasing byte order; anything else is rejected with
//! [`CoreError::OutOfOrder`] and leaves the builder usable. An I/O failure,
//! on the other hand, spends the builder: the partial output is discarded
//! and every further call fails with [`CoreError::BuilderSpent`].
//!
//! A file-backed build writes to a temporary file beside its target and
//! renames it into place only when `finish` succeeds. A build that is
//! dropped or fails leaves the target exactly as it was, and sets or maps
//! already open on the old file keep reading it.

use crate::config::Config;
use crate::error::{CoreError, CoreResult, ErrorKind};
use crate::map::Map;
use crate::set::Set;
use ordex_storage::{FileSink, IndexBytes, IndexSink, MemorySink};
use std::io;
use std::path::Path;

/// Where the encoder writes.
enum BuildSink {
    Memory(MemorySink),
    File(FileSink),
}

impl io::Write for BuildSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Memory(sink) => io::Write::write(sink, buf),
            Self::File(sink) => io::Write::write(sink, buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Memory(sink) => io::Write::flush(sink),
            Self::File(sink) => io::Write::flush(sink),
        }
    }
}

/// The fst builders share one lifecycle.
trait RawBuilder: Sized {
    fn start(sink: BuildSink) -> Result<Self, fst::Error>;
    fn into_sink(self) -> Result<BuildSink, fst::Error>;
}

impl RawBuilder for fst::SetBuilder<BuildSink> {
    fn start(sink: BuildSink) -> Result<Self, fst::Error> {
        fst::SetBuilder::new(sink)
    }

    fn into_sink(self) -> Result<BuildSink, fst::Error> {
        self.into_inner()
    }
}

impl RawBuilder for fst::MapBuilder<BuildSink> {
    fn start(sink: BuildSink) -> Result<Self, fst::Error> {
        fst::MapBuilder::new(sink)
    }

    fn into_sink(self) -> Result<BuildSink, fst::Error> {
        self.into_inner()
    }
}

/// Shared state machine behind [`SetBuilder`] and [`MapBuilder`].
struct Construction<B> {
    state: Option<B>,
    last: Option<String>,
    entries: u64,
    open_mode: ordex_storage::OpenMode,
}

impl<B: RawBuilder> Construction<B> {
    fn memory() -> CoreResult<Self> {
        let raw = B::start(BuildSink::Memory(MemorySink::new()))?;
        tracing::debug!("started in-memory build");
        Ok(Self {
            state: Some(raw),
            last: None,
            entries: 0,
            open_mode: Config::default().open_mode,
        })
    }

    fn file(path: &Path, config: &Config) -> CoreResult<Self> {
        let sink = FileSink::create(path, config.sink_options())?;
        let raw = B::start(BuildSink::File(sink))?;
        tracing::debug!(path = %path.display(), "started file-backed build");
        Ok(Self {
            state: Some(raw),
            last: None,
            entries: 0,
            open_mode: config.open_mode,
        })
    }

    fn push<F>(&mut self, key: &str, op: F) -> CoreResult<()>
    where
        F: FnOnce(&mut B) -> Result<(), fst::Error>,
    {
        let raw = self.state.as_mut().ok_or(CoreError::BuilderSpent)?;
        if let Some(previous) = self.last.as_deref() {
            if key <= previous {
                return Err(CoreError::OutOfOrder {
                    previous: previous.to_owned(),
                    got: key.to_owned(),
                });
            }
        }
        match op(raw) {
            Ok(()) => {
                let last = self.last.get_or_insert_with(String::new);
                last.clear();
                last.push_str(key);
                self.entries += 1;
                Ok(())
            }
            Err(err) => {
                let err = CoreError::from(err);
                if err.kind() != ErrorKind::OutOfOrder {
                    tracing::warn!(error = %err, "build failed; discarding partial output");
                    self.state = None;
                }
                Err(err)
            }
        }
    }

    fn finish(&mut self) -> CoreResult<IndexBytes> {
        let raw = self.state.take().ok_or(CoreError::BuilderSpent)?;

        let bytes = match raw.into_sink()? {
            BuildSink::Memory(sink) => IndexBytes::from_vec(sink.seal()?),
            BuildSink::File(sink) => {
                let path = sink.seal()?;
                IndexBytes::open(&path, self.open_mode)?
            }
        };

        tracing::debug!(entries = self.entries, bytes = bytes.len(), "finished build");
        Ok(bytes)
    }

    fn is_spent(&self) -> bool {
        self.state.is_none()
    }
}

/// Builds a [`Set`] from keys in strictly increasing order.
///
/// # Example
///
/// ```rust
/// use ordex_core::SetBuilder;
///
/// let mut builder = SetBuilder::memory().unwrap();
/// builder.insert("bar").unwrap();
/// builder.insert("foo").unwrap();
/// assert!(builder.insert("baz").is_err()); // out of order
///
/// let set = builder.finish().unwrap();
/// assert_eq!(set.len(), 2);
/// assert!(builder.finish().is_err()); // spent
/// ```
pub struct SetBuilder {
    inner: Construction<fst::SetBuilder<BuildSink>>,
}

impl SetBuilder {
    /// Creates a builder that encodes into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder cannot be initialized.
    pub fn memory() -> CoreResult<Self> {
        Ok(Self {
            inner: Construction::memory()?,
        })
    }

    /// Creates a builder that streams into the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] if the file cannot be created or locked.
    pub fn create(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::create_with(path, &Config::default())
    }

    /// Like [`SetBuilder::create`] with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] if the file cannot be created or locked.
    pub fn create_with(path: impl AsRef<Path>, config: &Config) -> CoreResult<Self> {
        Ok(Self {
            inner: Construction::file(path.as_ref(), config)?,
        })
    }

    /// Appends a key.
    ///
    /// # Errors
    ///
    /// - [`CoreError::OutOfOrder`] if `key` is not greater than the last key
    /// - [`CoreError::Io`] if writing fails (the builder is then spent)
    /// - [`CoreError::BuilderSpent`] after `finish` or a fatal error
    pub fn insert(&mut self, key: impl AsRef<str>) -> CoreResult<()> {
        let key = key.as_ref();
        self.inner.push(key, |raw| raw.insert(key))
    }

    /// Appends every key from `keys`, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Same as [`SetBuilder::insert`].
    pub fn extend<I, K>(&mut self, keys: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        keys.into_iter().try_for_each(|key| self.insert(key))
    }

    /// Returns the number of keys accepted so far.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.inner.entries
    }

    /// Returns true if no key was accepted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true once the builder can no longer be used.
    #[must_use]
    pub fn is_spent(&self) -> bool {
        self.inner.is_spent()
    }

    /// Seals the index and returns the finished set.
    ///
    /// # Errors
    ///
    /// - [`CoreError::BuilderSpent`] if already finished
    /// - [`CoreError::Io`] if flushing or reopening the file fails
    pub fn finish(&mut self) -> CoreResult<Set> {
        Set::from_index_bytes(self.inner.finish()?)
    }
}

/// Builds a [`Map`] from key/value pairs in strictly increasing key order.
pub struct MapBuilder {
    inner: Construction<fst::MapBuilder<BuildSink>>,
}

impl MapBuilder {
    /// Creates a builder that encodes into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder cannot be initialized.
    pub fn memory() -> CoreResult<Self> {
        Ok(Self {
            inner: Construction::memory()?,
        })
    }

    /// Creates a builder that streams into the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] if the file cannot be created or locked.
    pub fn create(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::create_with(path, &Config::default())
    }

    /// Like [`MapBuilder::create`] with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] if the file cannot be created or locked.
    pub fn create_with(path: impl AsRef<Path>, config: &Config) -> CoreResult<Self> {
        Ok(Self {
            inner: Construction::file(path.as_ref(), config)?,
        })
    }

    /// Appends a key/value pair.
    ///
    /// # Errors
    ///
    /// - [`CoreError::OutOfOrder`] if `key` is not greater than the last key
    /// - [`CoreError::Io`] if writing fails (the builder is then spent)
    /// - [`CoreError::BuilderSpent`] after `finish` or a fatal error
    pub fn insert(&mut self, key: impl AsRef<str>, value: u64) -> CoreResult<()> {
        let key = key.as_ref();
        self.inner.push(key, |raw| raw.insert(key, value))
    }

    /// Appends every pair from `entries`, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Same as [`MapBuilder::insert`].
    pub fn extend<I, K>(&mut self, entries: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = (K, u64)>,
        K: AsRef<str>,
    {
        entries
            .into_iter()
            .try_for_each(|(key, value)| self.insert(key, value))
    }

    /// Returns the number of entries accepted so far.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.inner.entries
    }

    /// Returns true if no entry was accepted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true once the builder can no longer be used.
    #[must_use]
    pub fn is_spent(&self) -> bool {
        self.inner.is_spent()
    }

    /// Seals the index and returns the finished map.
    ///
    /// # Errors
    ///
    /// - [`CoreError::BuilderSpent`] if already finished
    /// - [`CoreError::Io`] if flushing or reopening the file fails
    pub fn finish(&mut self) -> CoreResult<Map> {
        Map::from_index_bytes(self.inner.finish()?)
    }
}
