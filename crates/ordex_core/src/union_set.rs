//! A read-only view over the union of several sets.

use crate::error::CoreResult;
use crate::merge::MergeBuilder;
use crate::range::KeyRange;
use crate::set::Set;
use crate::stream::Stream;

/// Queries a group of sets as if they were one, without building a new
/// index.
///
/// Membership probes each set in turn. Iteration and ranges merge the
/// members lazily, emitting every distinct key once in ascending order.
///
/// # Example
///
/// ```rust
/// use ordex_core::{Set, UnionSet};
///
/// let a = Set::from_keys(["bar", "foo"]).unwrap();
/// let b = Set::from_keys(["baz", "foo"]).unwrap();
/// let all = UnionSet::new(&[&a, &b]);
///
/// assert!(all.contains("baz"));
/// let keys: Vec<String> = all.iter().collect::<Result<_, _>>().unwrap();
/// assert_eq!(keys, ["bar", "baz", "foo"]);
/// ```
#[derive(Debug, Clone)]
pub struct UnionSet<'a> {
    members: Vec<&'a Set>,
}

impl<'a> UnionSet<'a> {
    /// Creates a view over `sets`. An empty slice gives an empty view.
    #[must_use]
    pub fn new(sets: &[&'a Set]) -> Self {
        Self {
            members: sets.to_vec(),
        }
    }

    /// Returns the sets behind this view.
    #[must_use]
    pub fn members(&self) -> &[&'a Set] {
        &self.members
    }

    /// Returns true if any member contains `key`.
    #[must_use]
    pub fn contains(&self, key: impl AsRef<str>) -> bool {
        let key = key.as_ref();
        self.members.iter().any(|set| set.contains(key))
    }

    /// Streams the distinct keys of all members in ascending order.
    #[must_use]
    pub fn iter(&self) -> Stream<'a, String> {
        self.members
            .iter()
            .copied()
            .map(Set::iter)
            .collect::<MergeBuilder<'a, String>>()
            .union()
    }

    /// Streams the distinct keys inside `range` across all members.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRange`](crate::CoreError::InvalidRange)
    /// if the start lies after the end.
    pub fn range<R>(&self, range: R) -> CoreResult<Stream<'a, String>>
    where
        R: KeyRange,
    {
        crate::range::validate(&range)?;
        let mut merge = MergeBuilder::new();
        for set in self.members.iter().copied() {
            merge.push(set.range(&range)?);
        }
        Ok(merge.union())
    }
}
