//! Property-based test generators using proptest.
//!
//! Key strategies draw from a small alphabet so that independently
//! generated sets overlap often enough to exercise the merge paths.

use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Strategy for a single key: short, lowercase, occasionally non-ASCII.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-e]{0,4}|[a-e]{1,2}[öé]").expect("Invalid regex")
}

/// Strategy for a sorted, duplicate-free key set.
pub fn key_set_strategy(max_len: usize) -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(key_strategy(), 0..=max_len)
}

/// Strategy for a key-to-value map.
pub fn entries_strategy(max_len: usize) -> impl Strategy<Value = BTreeMap<String, u64>> {
    prop::collection::btree_map(key_strategy(), any::<u64>(), 0..=max_len)
}

/// Strategy for between one and `max_sets` key sets.
pub fn set_family_strategy(
    max_sets: usize,
    max_len: usize,
) -> impl Strategy<Value = Vec<BTreeSet<String>>> {
    prop::collection::vec(key_set_strategy(max_len), 1..=max_sets)
}

/// Strategy for between one and `max_maps` maps.
pub fn map_family_strategy(
    max_maps: usize,
    max_len: usize,
) -> impl Strategy<Value = Vec<BTreeMap<String, u64>>> {
    prop::collection::vec(entries_strategy(max_len), 1..=max_maps)
}

/// Strategy for a key range as optional `(start, end)` bounds.
pub fn bounds_strategy() -> impl Strategy<Value = (Option<String>, Option<String>)> {
    (
        prop::option::of(key_strategy()),
        prop::option::of(key_strategy()),
    )
}

/// Case and shrink budget shared by the property suites.
#[derive(Debug, Clone, Copy)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl PropTestConfig {
    /// Small budget for suites that build an index per case.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn keys_are_short(key in key_strategy()) {
            prop_assert!(key.chars().count() <= 4);
        }

        #[test]
        fn family_is_never_empty(family in set_family_strategy(4, 8)) {
            prop_assert!(!family.is_empty());
            prop_assert!(family.len() <= 4);
            prop_assert!(family.iter().all(|set| set.len() <= 8));
        }
    }
}
