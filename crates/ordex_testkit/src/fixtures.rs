//! Test fixtures for sets and maps.
//!
//! Provides containers built in memory or in a temporary directory that is
//! removed when the fixture is dropped.

use ordex_core::{Map, Set};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A test set with automatic cleanup.
pub struct TestSet {
    /// The set instance.
    pub set: Set,
    dir: Option<TempDir>,
}

impl TestSet {
    /// Builds a set in memory from sorted keys.
    pub fn memory<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        Self {
            set: Set::from_keys(keys).expect("Failed to build in-memory set"),
            dir: None,
        }
    }

    /// Builds a set into a file inside a fresh temporary directory.
    pub fn file<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("test.fst");
        let set = Set::from_keys_to_path(keys, &path).expect("Failed to build set file");
        Self {
            set,
            dir: Some(dir),
        }
    }

    /// Returns the index file path if file-based, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.path().join("test.fst"))
    }

    /// Reopens the index file, if any.
    pub fn reopen(&self) -> Option<Set> {
        self.path()
            .map(|path| Set::open(path).expect("Failed to reopen set"))
    }
}

impl std::ops::Deref for TestSet {
    type Target = Set;

    fn deref(&self) -> &Self::Target {
        &self.set
    }
}

/// A test map with automatic cleanup.
pub struct TestMap {
    /// The map instance.
    pub map: Map,
    dir: Option<TempDir>,
}

impl TestMap {
    /// Builds a map in memory from entries sorted by key.
    pub fn memory<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, u64)>,
        K: AsRef<str>,
    {
        Self {
            map: Map::from_entries(entries).expect("Failed to build in-memory map"),
            dir: None,
        }
    }

    /// Builds a map into a file inside a fresh temporary directory.
    pub fn file<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, u64)>,
        K: AsRef<str>,
    {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("test.fst");
        let map = Map::from_entries_to_path(entries, &path).expect("Failed to build map file");
        Self {
            map,
            dir: Some(dir),
        }
    }

    /// Returns the index file path if file-based, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.path().join("test.fst"))
    }
}

impl std::ops::Deref for TestMap {
    type Target = Map;

    fn deref(&self) -> &Self::Target {
        &self.map
    }
}

/// Runs a test with a temporary directory for index files.
pub fn with_temp_dir<F, R>(f: F) -> R
where
    F: FnOnce(&Path) -> R,
{
    let dir = TempDir::new().expect("Failed to create temp directory");
    f(dir.path())
}

/// Common data sets.
pub mod scenarios {
    use super::*;

    /// Sorted keys used throughout the tests, including a non-ASCII one.
    pub const KEYS: [&str; 4] = ["bar", "baz", "foo", "möö"];

    /// Sorted entries matching [`KEYS`].
    pub const ITEMS: [(&str, u64); 4] = [("bar", 2), ("baz", 1337), ("foo", 65536), ("möö", 1)];

    /// Two overlapping sets: `{bar, foo}` and `{baz, foo}`.
    pub fn overlapping_sets() -> (TestSet, TestSet) {
        (
            TestSet::memory(["bar", "foo"]),
            TestSet::memory(["baz", "foo"]),
        )
    }

    /// Two overlapping maps: `{bar: 8, baz: 16}` and `{bar: 32, moo: 64}`.
    pub fn overlapping_maps() -> (TestMap, TestMap) {
        (
            TestMap::memory([("bar", 8), ("baz", 16)]),
            TestMap::memory([("bar", 32), ("moo", 64)]),
        )
    }

    /// A set of `count` zero-padded numeric keys.
    pub fn numbered_set(count: usize) -> TestSet {
        TestSet::memory((0..count).map(|i| format!("key{i:08}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_set() {
        let set = TestSet::memory(scenarios::KEYS);
        assert_eq!(set.len(), 4);
        assert!(set.path().is_none());
        assert!(set.reopen().is_none());
    }

    #[test]
    fn test_file_set_reopens() {
        let set = TestSet::file(scenarios::KEYS);
        let path = set.path().unwrap();
        assert!(path.exists());

        let reopened = set.reopen().unwrap();
        assert_eq!(reopened.len(), 4);
        assert!(reopened.contains("möö"));
    }

    #[test]
    fn test_file_map() {
        let map = TestMap::file(scenarios::ITEMS);
        assert!(map.path().unwrap().exists());
        assert_eq!(map.get("baz").unwrap(), 1337);
    }

    #[test]
    fn test_numbered_scenario() {
        let set = scenarios::numbered_set(100);
        assert_eq!(set.len(), 100);
        assert!(set.contains("key00000042"));
    }

    #[test]
    fn test_with_temp_dir() {
        let len = with_temp_dir(|dir| {
            let path = dir.join("nested.fst");
            Set::from_keys_to_path(["a"], &path).unwrap().len()
        });
        assert_eq!(len, 1);
    }
}
