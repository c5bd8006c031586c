//! Immutable ordered maps from strings to unsigned integers.

use crate::builder::MapBuilder;
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::merge::{IndexedValue, MergeBuilder};
use crate::range::{self, KeyRange};
use crate::search;
use crate::stream::{EntryCursor, KeyCursor, Stream, ValueCursor};
use fst::{Automaton, IntoStreamer};
use ordex_storage::IndexBytes;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Items yielded by map set operations: a key and its value in each source
/// that holds it.
pub type MergedEntry = (String, Vec<IndexedValue>);

/// An immutable, ordered map from strings to `u64` values.
///
/// Shares the storage model of [`Set`](crate::Set): file backed or in
/// memory, never modified after construction, cheap to clone.
///
/// # Example
///
/// ```rust
/// use ordex_core::Map;
///
/// let map = Map::from_entries([("bar", 2), ("baz", 1337), ("foo", 65536)]).unwrap();
/// assert_eq!(map.get("baz").unwrap(), 1337);
/// assert!(map.get("qux").is_err());
/// ```
#[derive(Clone)]
pub struct Map {
    index: Arc<fst::Map<IndexBytes>>,
}

impl Map {
    pub(crate) fn from_index_bytes(bytes: IndexBytes) -> CoreResult<Self> {
        let index = fst::Map::new(bytes)?;
        Ok(Self {
            index: Arc::new(index),
        })
    }

    /// Opens a map previously built to `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Io`] if the file cannot be read
    /// - [`CoreError::CorruptIndex`] if it does not hold a valid index
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::open_with(path, &Config::default())
    }

    /// Like [`Map::open`] with explicit configuration.
    ///
    /// # Errors
    ///
    /// Same as [`Map::open`].
    pub fn open_with(path: impl AsRef<Path>, config: &Config) -> CoreResult<Self> {
        let path = path.as_ref();
        let bytes = IndexBytes::open(path, config.open_mode)?;
        let map = Self::from_index_bytes(bytes).inspect_err(|err| {
            tracing::warn!(path = %path.display(), error = %err, "rejected map index");
        })?;
        tracing::debug!(path = %path.display(), entries = map.len(), "opened map");
        Ok(map)
    }

    /// Loads a map from an encoded index held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CorruptIndex`] if `bytes` is not a valid index.
    pub fn from_bytes(bytes: Vec<u8>) -> CoreResult<Self> {
        Self::from_index_bytes(IndexBytes::from_vec(bytes))
    }

    /// Builds an in-memory map from entries in strictly increasing key order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::OutOfOrder`] at the first key that is not
    /// greater than its predecessor.
    pub fn from_entries<I, K>(entries: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (K, u64)>,
        K: AsRef<str>,
    {
        let mut builder = MapBuilder::memory()?;
        builder.extend(entries)?;
        builder.finish()
    }

    /// Builds a map from sorted entries into the file at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::OutOfOrder`] for unsorted input; no file is left behind
    /// - [`CoreError::Io`] if the file cannot be written
    pub fn from_entries_to_path<I, K>(entries: I, path: impl AsRef<Path>) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (K, u64)>,
        K: AsRef<str>,
    {
        let mut builder = MapBuilder::create(path)?;
        builder.extend(entries)?;
        builder.finish()
    }

    /// Builds an in-memory map from entries in any order.
    ///
    /// Entries are sorted by key before encoding.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::OutOfOrder`] if a key occurs more than once.
    pub fn from_unsorted<I, K>(entries: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (K, u64)>,
        K: Into<String>,
    {
        let mut entries: Vec<(String, u64)> = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        Self::from_entries(entries)
    }

    /// Returns a builder that encodes into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder cannot be initialized.
    pub fn builder() -> CoreResult<MapBuilder> {
        MapBuilder::memory()
    }

    /// Returns a builder that streams into the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] if the file cannot be created or locked.
    pub fn builder_at(path: impl AsRef<Path>) -> CoreResult<MapBuilder> {
        MapBuilder::create(path)
    }

    /// Returns true if `key` has a value.
    #[must_use]
    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.index.contains_key(key.as_ref())
    }

    /// Returns the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::KeyNotFound`] if the key is absent.
    pub fn get(&self, key: impl AsRef<str>) -> CoreResult<u64> {
        let key = key.as_ref();
        self.index
            .get(key)
            .ok_or_else(|| CoreError::key_not_found(key))
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Streams every entry in ascending key order.
    #[must_use]
    pub fn iter(&self) -> Stream<'_, (String, u64)> {
        Stream::new(EntryCursor::new(self.index.stream()))
    }

    /// Streams every key in ascending order.
    #[must_use]
    pub fn keys(&self) -> Stream<'_, String> {
        Stream::new(KeyCursor::new(self.index.keys()))
    }

    /// Streams every value in ascending order of their keys.
    #[must_use]
    pub fn values(&self) -> Stream<'_, u64> {
        Stream::new(ValueCursor::new(self.index.values()))
    }

    /// Streams the entries whose keys fall inside `range`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRange`] if the start lies after the end.
    pub fn range<R>(&self, range: R) -> CoreResult<Stream<'_, (String, u64)>>
    where
        R: KeyRange,
    {
        let builder = range::apply(self.index.range(), &range)?;
        Ok(Stream::new(EntryCursor::new(builder.into_stream())))
    }

    /// Streams entries whose keys are within `max_distance` edits of `term`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AutomatonTooLarge`] if `max_distance` is above
    /// [`MAX_FUZZY_DISTANCE`](crate::MAX_FUZZY_DISTANCE) or the matcher would
    /// exceed the state limit.
    pub fn search(&self, term: &str, max_distance: u32) -> CoreResult<Stream<'_, (String, u64)>> {
        Ok(self.search_with(search::fuzzy(term, max_distance)?))
    }

    /// Streams entries whose keys match the whole of `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Pattern`] for invalid or unsupported syntax.
    pub fn search_pattern(&self, pattern: &str) -> CoreResult<Stream<'_, (String, u64)>> {
        Ok(self.search_with(search::pattern(pattern)?))
    }

    /// Streams entries whose keys a caller-supplied automaton accepts.
    #[must_use]
    pub fn search_with<'a, A>(&'a self, automaton: A) -> Stream<'a, (String, u64)>
    where
        A: Automaton + 'a,
    {
        Stream::new(EntryCursor::new(self.index.search(automaton).into_stream()))
    }

    /// Starts a merge with this map's entries as source 0.
    #[must_use]
    pub fn op(&self) -> MergeBuilder<'_, (String, u64)> {
        let mut merge = MergeBuilder::new();
        merge.push(self.iter());
        merge
    }

    /// Streams keys present in `self` or any of `others`, with their values.
    #[must_use]
    pub fn union<'a>(&'a self, others: &[&'a Map]) -> Stream<'a, MergedEntry> {
        self.merge_with(others).union()
    }

    /// Streams keys present in `self` and all of `others`, with their values.
    #[must_use]
    pub fn intersection<'a>(&'a self, others: &[&'a Map]) -> Stream<'a, MergedEntry> {
        self.merge_with(others).intersection()
    }

    /// Streams keys of `self` present in none of `others`, with their values.
    #[must_use]
    pub fn difference<'a>(&'a self, others: &[&'a Map]) -> Stream<'a, MergedEntry> {
        self.merge_with(others).difference()
    }

    /// Streams keys present in exactly one of `self` and `others`.
    #[must_use]
    pub fn symmetric_difference<'a>(&'a self, others: &[&'a Map]) -> Stream<'a, MergedEntry> {
        self.merge_with(others).symmetric_difference()
    }

    fn merge_with<'a>(&'a self, others: &[&'a Map]) -> MergeBuilder<'a, (String, u64)> {
        let mut merge = self.op();
        merge.extend(others.iter().copied().map(Map::iter));
        merge
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use tempfile::tempdir;

    const ITEMS: [(&str, u64); 4] = [("bar", 2), ("baz", 1337), ("foo", 65536), ("möö", 1)];

    fn sample() -> Map {
        Map::from_entries(ITEMS).unwrap()
    }

    fn entries(stream: Stream<'_, (String, u64)>) -> Vec<(String, u64)> {
        stream.collect::<CoreResult<_>>().unwrap()
    }

    fn owned(items: &[(&str, u64)]) -> Vec<(String, u64)> {
        items.iter().map(|&(k, v)| (k.to_string(), v)).collect()
    }

    fn iv(index: usize, value: u64) -> IndexedValue {
        IndexedValue { index, value }
    }

    #[test]
    fn lookup() {
        let map = sample();
        assert_eq!(map.len(), 4);
        assert_eq!(map.get("foo").unwrap(), 65536);
        assert_eq!(map.get("möö").unwrap(), 1);
        assert!(map.contains_key("bar"));
        assert!(!map.contains_key("ba"));

        let err = map.get("qux").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::KeyNotFound);
        assert_eq!(err.to_string(), "key 'qux' not in map");
    }

    #[test]
    fn iteration_views() {
        let map = sample();
        assert_eq!(entries(map.iter()), owned(&ITEMS));
        assert_eq!(
            map.keys().collect::<CoreResult<Vec<_>>>().unwrap(),
            ["bar", "baz", "foo", "möö"]
        );
        assert_eq!(
            map.values().collect::<CoreResult<Vec<_>>>().unwrap(),
            [2, 1337, 65536, 1]
        );
    }

    #[test]
    fn file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.fst");
        Map::from_entries_to_path(ITEMS, &path).unwrap();

        let map = Map::open(&path).unwrap();
        assert_eq!(entries(map.iter()), owned(&ITEMS));
    }

    #[test]
    fn unsorted_input_is_sorted_first() {
        let map = Map::from_unsorted([("foo", 3), ("bar", 1), ("baz", 2)]).unwrap();
        assert_eq!(
            entries(map.iter()),
            owned(&[("bar", 1), ("baz", 2), ("foo", 3)])
        );

        let err = Map::from_unsorted([("a", 1), ("a", 2)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfOrder);
    }

    #[test]
    fn ranges_and_searches() {
        let map = sample();
        assert_eq!(
            entries(map.range("baz".."m").unwrap()),
            owned(&[("baz", 1337), ("foo", 65536)])
        );
        assert_eq!(
            map.range("z".."a").unwrap_err().kind(),
            ErrorKind::InvalidRange
        );
        assert_eq!(
            entries(map.search("bam", 1).unwrap()),
            owned(&[("bar", 2), ("baz", 1337)])
        );
        assert_eq!(
            entries(map.search_pattern("f.*").unwrap()),
            owned(&[("foo", 65536)])
        );
    }

    #[test]
    fn union_tags_sources() {
        let a = Map::from_entries([("bar", 8), ("baz", 16)]).unwrap();
        let b = Map::from_entries([("bar", 32), ("moo", 64)]).unwrap();

        let merged: Vec<MergedEntry> = a.union(&[&b]).collect::<CoreResult<_>>().unwrap();
        assert_eq!(
            merged,
            vec![
                ("bar".to_string(), vec![iv(0, 8), iv(1, 32)]),
                ("baz".to_string(), vec![iv(0, 16)]),
                ("moo".to_string(), vec![iv(1, 64)]),
            ]
        );
    }

    #[test]
    fn other_operations() {
        let a = Map::from_entries([("bar", 8), ("baz", 16)]).unwrap();
        let b = Map::from_entries([("bar", 32), ("moo", 64)]).unwrap();

        let collect = |s: Stream<'_, MergedEntry>| s.collect::<CoreResult<Vec<_>>>().unwrap();

        assert_eq!(
            collect(a.intersection(&[&b])),
            vec![("bar".to_string(), vec![iv(0, 8), iv(1, 32)])]
        );
        assert_eq!(
            collect(a.difference(&[&b])),
            vec![("baz".to_string(), vec![iv(0, 16)])]
        );
        assert_eq!(
            collect(a.symmetric_difference(&[&b])),
            vec![
                ("baz".to_string(), vec![iv(0, 16)]),
                ("moo".to_string(), vec![iv(1, 64)]),
            ]
        );
    }

    #[test]
    fn corrupt_bytes_rejected() {
        let err = Map::from_bytes(vec![0xff; 16]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptIndex);
    }
}
