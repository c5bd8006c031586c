//! Immutable ordered string sets.

use crate::builder::SetBuilder;
use crate::config::Config;
use crate::error::CoreResult;
use crate::merge::MergeBuilder;
use crate::range::{self, KeyRange};
use crate::search;
use crate::stream::{KeyCursor, Stream};
use fst::{Automaton, IntoStreamer};
use ordex_storage::IndexBytes;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// An immutable, ordered set of strings backed by a finite state index.
///
/// Keys are compared by their UTF-8 bytes. A set is either loaded from a
/// file (memory mapped by default) or built in memory, and never changes
/// afterwards. Cloning is cheap; clones share the underlying index.
///
/// # Example
///
/// ```rust
/// use ordex_core::Set;
///
/// let set = Set::from_keys(["bar", "baz", "foo"]).unwrap();
/// assert!(set.contains("baz"));
/// assert_eq!(set.len(), 3);
///
/// let near: Vec<String> = set.search("bam", 1).unwrap().collect::<Result<_, _>>().unwrap();
/// assert_eq!(near, ["bar", "baz"]);
/// ```
#[derive(Clone)]
pub struct Set {
    index: Arc<fst::Set<IndexBytes>>,
}

impl Set {
    pub(crate) fn from_index_bytes(bytes: IndexBytes) -> CoreResult<Self> {
        let index = fst::Set::new(bytes)?;
        Ok(Self {
            index: Arc::new(index),
        })
    }

    /// Opens a set previously built to `path`.
    ///
    /// # Errors
    ///
    /// - `Io` if the file cannot be read
    /// - `CorruptIndex` if it does not hold a valid index
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::open_with(path, &Config::default())
    }

    /// Like [`Set::open`] with explicit configuration.
    ///
    /// # Errors
    ///
    /// Same as [`Set::open`].
    pub fn open_with(path: impl AsRef<Path>, config: &Config) -> CoreResult<Self> {
        let path = path.as_ref();
        let bytes = IndexBytes::open(path, config.open_mode)?;
        let set = Self::from_index_bytes(bytes).inspect_err(|err| {
            tracing::warn!(path = %path.display(), error = %err, "rejected set index");
        })?;
        tracing::debug!(path = %path.display(), keys = set.len(), "opened set");
        Ok(set)
    }

    /// Loads a set from an encoded index held in memory.
    ///
    /// # Errors
    ///
    /// Returns `CorruptIndex` if `bytes` is not a valid index.
    pub fn from_bytes(bytes: Vec<u8>) -> CoreResult<Self> {
        Self::from_index_bytes(IndexBytes::from_vec(bytes))
    }

    /// Builds an in-memory set from keys in strictly increasing order.
    ///
    /// # Errors
    ///
    /// Returns `OutOfOrder` at the first key that is not
    /// greater than its predecessor.
    pub fn from_keys<I, K>(keys: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut builder = SetBuilder::memory()?;
        builder.extend(keys)?;
        builder.finish()
    }

    /// Builds a set from sorted keys into the file at `path`.
    ///
    /// # Errors
    ///
    /// - `OutOfOrder` for unsorted input; no file is left behind
    /// - `Io` if the file cannot be written
    pub fn from_keys_to_path<I, K>(keys: I, path: impl AsRef<Path>) -> CoreResult<Self>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut builder = SetBuilder::create(path)?;
        builder.extend(keys)?;
        builder.finish()
    }

    /// Returns a builder that encodes into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder cannot be initialized.
    pub fn builder() -> CoreResult<SetBuilder> {
        SetBuilder::memory()
    }

    /// Returns a builder that streams into the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be created or locked.
    pub fn builder_at(path: impl AsRef<Path>) -> CoreResult<SetBuilder> {
        SetBuilder::create(path)
    }

    /// Returns true if `key` is in the set.
    #[must_use]
    pub fn contains(&self, key: impl AsRef<str>) -> bool {
        self.index.contains(key.as_ref())
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if the set holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Streams every key in ascending order.
    #[must_use]
    pub fn iter(&self) -> Stream<'_, String> {
        Stream::new(KeyCursor::new(self.index.stream()))
    }

    /// Streams the keys inside `range` in ascending order.
    ///
    /// Accepts any string range (`"b".."f"`, `"b"..`, `..="f"`, `..`) or a
    /// pair of [`Bound`](std::ops::Bound)s.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if the start lies after the end.
    pub fn range<R>(&self, range: R) -> CoreResult<Stream<'_, String>>
    where
        R: KeyRange,
    {
        let builder = range::apply(self.index.range(), &range)?;
        Ok(Stream::new(KeyCursor::new(builder.into_stream())))
    }

    /// Streams keys within `max_distance` edits of `term`.
    ///
    /// # Errors
    ///
    /// Returns `AutomatonTooLarge` if `max_distance` is above
    /// [`MAX_FUZZY_DISTANCE`](crate::MAX_FUZZY_DISTANCE) or the matcher for
    /// `term` would exceed the state limit.
    pub fn search(&self, term: &str, max_distance: u32) -> CoreResult<Stream<'_, String>> {
        Ok(self.search_with(search::fuzzy(term, max_distance)?))
    }

    /// Streams keys matching the whole of `pattern`.
    ///
    /// # Errors
    ///
    /// Returns `Pattern` for invalid syntax, anchors, word
    /// boundaries, lazy repetition or an oversized pattern.
    pub fn search_pattern(&self, pattern: &str) -> CoreResult<Stream<'_, String>> {
        Ok(self.search_with(search::pattern(pattern)?))
    }

    /// Streams keys accepted by a caller-supplied automaton.
    #[must_use]
    pub fn search_with<'a, A>(&'a self, automaton: A) -> Stream<'a, String>
    where
        A: Automaton + 'a,
    {
        Stream::new(KeyCursor::new(self.index.search(automaton).into_stream()))
    }

    /// Returns true if every key of `self` is in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Set) -> bool {
        self.index.is_subset(&*other.index)
    }

    /// Returns true if every key of `other` is in `self`.
    #[must_use]
    pub fn is_superset(&self, other: &Set) -> bool {
        self.index.is_superset(&*other.index)
    }

    /// Returns true if `self` and `other` share no key.
    #[must_use]
    pub fn is_disjoint(&self, other: &Set) -> bool {
        self.index.is_disjoint(&*other.index)
    }

    /// Starts a merge with this set's keys as source 0.
    ///
    /// Push further streams (ranges, searches, other merges) and finish
    /// with one of the set operations.
    #[must_use]
    pub fn op(&self) -> MergeBuilder<'_, String> {
        let mut merge = MergeBuilder::new();
        merge.push(self.iter());
        merge
    }

    /// Streams keys present in `self` or any of `others`.
    #[must_use]
    pub fn union<'a>(&'a self, others: &[&'a Set]) -> Stream<'a, String> {
        self.merge_with(others).union()
    }

    /// Streams keys present in `self` and all of `others`.
    #[must_use]
    pub fn intersection<'a>(&'a self, others: &[&'a Set]) -> Stream<'a, String> {
        self.merge_with(others).intersection()
    }

    /// Streams keys of `self` present in none of `others`.
    #[must_use]
    pub fn difference<'a>(&'a self, others: &[&'a Set]) -> Stream<'a, String> {
        self.merge_with(others).difference()
    }

    /// Streams keys present in exactly one of `self` and `others`.
    #[must_use]
    pub fn symmetric_difference<'a>(&'a self, others: &[&'a Set]) -> Stream<'a, String> {
        self.merge_with(others).symmetric_difference()
    }

    fn merge_with<'a>(&'a self, others: &[&'a Set]) -> MergeBuilder<'a, String> {
        let mut merge = self.op();
        merge.extend(others.iter().copied().map(Set::iter));
        merge
    }
}

impl fmt::Debug for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Set").field("len", &self.len()).finish()
    }
}
