//! Reference model for verifying containers.
//!
//! The model keeps the same data in std collections and computes what every
//! query should return, so tests can compare an index against it.

use ordex_core::{CoreResult, IndexedValue, MergeOp, Set, Stream};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// Drains a stream, panicking on the first error.
pub fn collect<T>(stream: Stream<'_, T>) -> Vec<T> {
    stream
        .collect::<CoreResult<Vec<T>>>()
        .expect("Stream yielded an error")
}

/// Converts optional `(start, end)` bounds into a half-open range.
pub fn half_open<'a>(
    start: Option<&'a str>,
    end: Option<&'a str>,
) -> (Bound<&'a str>, Bound<&'a str>) {
    (
        start.map_or(Bound::Unbounded, Bound::Included),
        end.map_or(Bound::Unbounded, Bound::Excluded),
    )
}

/// Edit distance between two strings, counted in characters.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitute = diagonal + usize::from(ca != *cb);
            diagonal = row[j + 1];
            row[j + 1] = substitute.min(row[j] + 1).min(diagonal + 1);
        }
    }
    row[b.len()]
}

/// The expected set of a model set.
#[derive(Debug, Clone, Default)]
pub struct SetModel {
    keys: BTreeSet<String>,
}

impl SetModel {
    /// Creates a model holding `keys`.
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the modelled keys.
    pub fn keys(&self) -> &BTreeSet<String> {
        &self.keys
    }

    /// Builds the matching in-memory set.
    pub fn build(&self) -> Set {
        Set::from_keys(&self.keys).expect("Failed to build set from model")
    }

    /// Asserts that `set` iterates exactly the modelled keys.
    pub fn verify_iter(&self, set: &Set) {
        let actual = collect(set.iter());
        let expected: Vec<&String> = self.keys.iter().collect();
        assert_eq!(actual.iter().collect::<Vec<_>>(), expected, "iteration mismatch");
        assert_eq!(set.len(), self.keys.len(), "length mismatch");
    }

    /// Asserts that `set` agrees with the model on every sampled key.
    pub fn verify_contains<'p>(&self, set: &Set, samples: impl IntoIterator<Item = &'p str>) {
        for key in samples {
            assert_eq!(
                set.contains(key),
                self.keys.contains(key),
                "membership mismatch for {key:?}"
            );
        }
    }

    /// Keys in `[start, end)`, either bound optional.
    pub fn range(&self, start: Option<&str>, end: Option<&str>) -> Vec<String> {
        self.keys
            .iter()
            .filter(|key| start.is_none_or(|s| key.as_str() >= s))
            .filter(|key| end.is_none_or(|e| key.as_str() < e))
            .cloned()
            .collect()
    }

    /// Keys within `max_distance` edits of `term`.
    pub fn within_distance(&self, term: &str, max_distance: usize) -> Vec<String> {
        self.keys
            .iter()
            .filter(|key| edit_distance(term, key) <= max_distance)
            .cloned()
            .collect()
    }
}

/// Expected output of merging `sources` with `op`.
pub fn expected_merge(op: MergeOp, sources: &[BTreeSet<String>]) -> Vec<String> {
    let mut owners: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, source) in sources.iter().enumerate() {
        for key in source {
            owners.entry(key.as_str()).or_default().push(index);
        }
    }
    owners
        .into_iter()
        .filter(|(_, indices)| accepts(op, indices, sources.len()))
        .map(|(key, _)| key.to_string())
        .collect()
}

/// Expected output of merging map `sources` with `op`.
pub fn expected_map_merge(
    op: MergeOp,
    sources: &[BTreeMap<String, u64>],
) -> Vec<(String, Vec<IndexedValue>)> {
    let mut owners: BTreeMap<&str, Vec<IndexedValue>> = BTreeMap::new();
    for (index, source) in sources.iter().enumerate() {
        for (key, &value) in source {
            owners
                .entry(key.as_str())
                .or_default()
                .push(IndexedValue { index, value });
        }
    }
    owners
        .into_iter()
        .filter(|(_, values)| {
            let indices: Vec<usize> = values.iter().map(|v| v.index).collect();
            accepts(op, &indices, sources.len())
        })
        .map(|(key, values)| (key.to_string(), values))
        .collect()
}

fn accepts(op: MergeOp, indices: &[usize], sources: usize) -> bool {
    match op {
        MergeOp::Union => true,
        MergeOp::Intersection => indices.len() == sources,
        MergeOp::Difference => matches!(indices, [0]),
        MergeOp::SymmetricDifference => indices.len() == 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{scenarios, TestSet};
    use crate::generators::*;
    use ordex_core::{ErrorKind, Map, MergeBuilder, UnionSet};
    use proptest::prelude::*;

    const OPS: [MergeOp; 4] = [
        MergeOp::Union,
        MergeOp::Intersection,
        MergeOp::Difference,
        MergeOp::SymmetricDifference,
    ];

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("bam", "bar"), 1);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("möö", "moo"), 2);
        assert_eq!(edit_distance("", "abc"), 3);
    }

    #[test]
    fn model_merge_matches_known_results() {
        let a: BTreeSet<String> = ["bar", "foo"].map(String::from).into();
        let b: BTreeSet<String> = ["baz", "foo"].map(String::from).into();
        let sources = [a, b];

        assert_eq!(expected_merge(MergeOp::Union, &sources), ["bar", "baz", "foo"]);
        assert_eq!(expected_merge(MergeOp::Intersection, &sources), ["foo"]);
        assert_eq!(expected_merge(MergeOp::Difference, &sources), ["bar"]);
        assert_eq!(
            expected_merge(MergeOp::SymmetricDifference, &sources),
            ["bar", "baz"]
        );
    }

    #[test]
    fn file_fixture_matches_model() {
        crate::init_tracing();
        let fixture = TestSet::file(scenarios::KEYS);
        let model = SetModel::new(scenarios::KEYS);

        model.verify_iter(&fixture);
        model.verify_iter(&fixture.reopen().unwrap());
        model.verify_contains(&fixture, ["bar", "ba", "möö", "moo", ""]);
    }

    #[test]
    fn fuzzy_search_substitutes_multibyte() {
        let model = SetModel::new(["aé", "aö", "bö", "öö"]);
        let set = model.build();
        let found = collect(set.search("aé", 1).unwrap());
        assert_eq!(found, ["aé", "aö"]);
        assert_eq!(found, model.within_distance("aé", 1));
    }

    #[test]
    fn large_set_iterates_in_order() {
        let fixture = scenarios::numbered_set(10_000);
        let model = SetModel::new((0..10_000).map(|i| format!("key{i:08}")));
        model.verify_iter(&fixture);
    }

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn iteration_matches_model(keys in key_set_strategy(32)) {
            let model = SetModel::new(keys);
            let set = model.build();
            model.verify_iter(&set);
            model.verify_contains(&set, ["", "a", "ab", "abc", "eö", "zzz"]);
        }

        #[test]
        fn bytes_round_trip(keys in key_set_strategy(32)) {
            let model = SetModel::new(keys);
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("prop.fst");
            Set::from_keys_to_path(model.keys(), &path).unwrap();

            let bytes = std::fs::read(&path).unwrap();
            model.verify_iter(&Set::from_bytes(bytes).unwrap());
            model.verify_iter(&Set::open(&path).unwrap());
        }

        #[test]
        fn range_matches_model(keys in key_set_strategy(32), (start, end) in bounds_strategy()) {
            let model = SetModel::new(keys);
            let set = model.build();
            let result = set.range(half_open(start.as_deref(), end.as_deref()));

            match (&start, &end) {
                (Some(s), Some(e)) if s > e => {
                    prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidRange);
                }
                _ => {
                    prop_assert_eq!(
                        collect(result.unwrap()),
                        model.range(start.as_deref(), end.as_deref())
                    );
                }
            }
        }

        #[test]
        fn fuzzy_search_matches_model(
            keys in key_set_strategy(32),
            term in key_strategy(),
            distance in 0u32..=2,
        ) {
            let model = SetModel::new(keys);
            let set = model.build();
            prop_assert_eq!(
                collect(set.search(&term, distance).unwrap()),
                model.within_distance(&term, distance as usize)
            );
        }

        #[test]
        fn merge_matches_model(family in set_family_strategy(4, 16)) {
            let sets: Vec<Set> = family.iter().map(|keys| Set::from_keys(keys).unwrap()).collect();
            for op in OPS {
                let merge: MergeBuilder<'_, String> = sets.iter().map(Set::iter).collect();
                prop_assert_eq!(collect(merge.build(op)), expected_merge(op, &family), "{}", op);
            }
        }

        #[test]
        fn set_methods_agree_with_merge(family in set_family_strategy(4, 16)) {
            let sets: Vec<Set> = family.iter().map(|keys| Set::from_keys(keys).unwrap()).collect();
            let (first, rest) = sets.split_first().unwrap();
            let rest: Vec<&Set> = rest.iter().collect();

            prop_assert_eq!(collect(first.union(&rest)), expected_merge(MergeOp::Union, &family));
            prop_assert_eq!(
                collect(first.intersection(&rest)),
                expected_merge(MergeOp::Intersection, &family)
            );
            prop_assert_eq!(
                collect(first.difference(&rest)),
                expected_merge(MergeOp::Difference, &family)
            );
            prop_assert_eq!(
                collect(first.symmetric_difference(&rest)),
                expected_merge(MergeOp::SymmetricDifference, &family)
            );

            let all: Vec<&Set> = sets.iter().collect();
            let union = UnionSet::new(&all);
            prop_assert_eq!(collect(union.iter()), expected_merge(MergeOp::Union, &family));
        }

        #[test]
        fn map_merge_matches_model(family in map_family_strategy(3, 12)) {
            let maps: Vec<Map> = family
                .iter()
                .map(|entries| Map::from_entries(entries.iter().map(|(k, v)| (k, *v))).unwrap())
                .collect();
            for op in OPS {
                let merge: MergeBuilder<'_, (String, u64)> = maps.iter().map(Map::iter).collect();
                prop_assert_eq!(collect(merge.build(op)), expected_map_merge(op, &family), "{}", op);
            }
        }

        #[test]
        fn relations_match_model(a in key_set_strategy(12), b in key_set_strategy(12)) {
            let (sa, sb) = (Set::from_keys(&a).unwrap(), Set::from_keys(&b).unwrap());
            prop_assert_eq!(sa.is_subset(&sb), a.is_subset(&b));
            prop_assert_eq!(sa.is_superset(&sb), a.is_superset(&b));
            prop_assert_eq!(sa.is_disjoint(&sb), a.is_disjoint(&b));
        }

        #[test]
        fn unsorted_map_build_sorts(entries in entries_strategy(24)) {
            let mut shuffled: Vec<(String, u64)> = entries.clone().into_iter().collect();
            shuffled.reverse();
            let map = Map::from_unsorted(shuffled).unwrap();
            let expected: Vec<(String, u64)> = entries.into_iter().collect();
            prop_assert_eq!(collect(map.iter()), expected);
        }
    }
}
