//! K-way merge of sorted streams.
//!
//! A merge holds one pending entry per live source in a min-heap keyed by
//! `(key, source index)`. Each step pops every entry sharing the smallest
//! key, pulls a replacement from each of those sources, and then decides
//! from the set of sources that contained the key whether to emit it:
//!
//! | operation              | emitted when the key occurs in     |
//! |------------------------|------------------------------------|
//! | union                  | any source                         |
//! | intersection           | every source                       |
//! | difference             | source 0 and no other              |
//! | symmetric difference   | exactly one source                 |
//!
//! Output keys are strictly increasing and each is emitted at most once.

use crate::error::CoreResult;
use crate::stream::{Cursor, Stream};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

/// A set-algebra operation over sorted streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeOp {
    /// Keys present in any source.
    Union,
    /// Keys present in every source.
    Intersection,
    /// Keys present in the first source only.
    Difference,
    /// Keys present in exactly one source.
    SymmetricDifference,
}

impl MergeOp {
    /// Returns the operation name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Union => "union",
            Self::Intersection => "intersection",
            Self::Difference => "difference",
            Self::SymmetricDifference => "symmetric_difference",
        }
    }

    fn accepts<P>(self, members: &[(usize, P)], sources: usize) -> bool {
        match self {
            Self::Union => true,
            Self::Intersection => members.len() == sources,
            Self::Difference => matches!(members, [(0, _)]),
            Self::SymmetricDifference => members.len() == 1,
        }
    }
}

impl fmt::Display for MergeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A map value tagged with the position of the map it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexedValue {
    /// Position of the source in the merge, starting at 0.
    pub index: usize,
    /// The value stored under the key in that source.
    pub value: u64,
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for String {}
    impl Sealed for (String, u64) {}
}

/// Stream items that can take part in a merge.
///
/// Set keys merge into plain keys. Map entries merge into a key plus the
/// [`IndexedValue`]s of every source holding it, ordered by source index.
pub trait MergeItem: sealed::Sealed + Sized + 'static {
    /// Per-source data carried alongside the key.
    type Payload: 'static;
    /// What the merged stream yields.
    type Merged: 'static;

    #[doc(hidden)]
    fn split(self) -> (String, Self::Payload);

    #[doc(hidden)]
    fn combine(key: String, members: Vec<(usize, Self::Payload)>) -> Self::Merged;
}

impl MergeItem for String {
    type Payload = ();
    type Merged = String;

    fn split(self) -> (String, ()) {
        (self, ())
    }

    fn combine(key: String, _members: Vec<(usize, ())>) -> String {
        key
    }
}

impl MergeItem for (String, u64) {
    type Payload = u64;
    type Merged = (String, Vec<IndexedValue>);

    fn split(self) -> (String, u64) {
        self
    }

    fn combine(key: String, members: Vec<(usize, u64)>) -> (String, Vec<IndexedValue>) {
        let values = members
            .into_iter()
            .map(|(index, value)| IndexedValue { index, value })
            .collect();
        (key, values)
    }
}

struct HeapEntry<P> {
    key: String,
    source: usize,
    payload: P,
}

impl<P> PartialEq for HeapEntry<P> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.source == other.source
    }
}

impl<P> Eq for HeapEntry<P> {}

impl<P> Ord for HeapEntry<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the smallest key and,
        // among equal keys, the lowest source index first.
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.source.cmp(&self.source))
    }
}

impl<P> PartialOrd for HeapEntry<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct MergeCursor<'a, T: MergeItem> {
    op: MergeOp,
    sources: Vec<Stream<'a, T>>,
    heap: BinaryHeap<HeapEntry<T::Payload>>,
    first_live: bool,
    initialized: bool,
}

impl<'a, T: MergeItem> MergeCursor<'a, T> {
    fn new(op: MergeOp, sources: Vec<Stream<'a, T>>) -> Self {
        let heap = BinaryHeap::with_capacity(sources.len());
        Self {
            op,
            sources,
            heap,
            first_live: true,
            initialized: false,
        }
    }

    fn pull(&mut self, source: usize) -> CoreResult<()> {
        match self.sources[source].next() {
            Some(item) => {
                let (key, payload) = item?.split();
                self.heap.push(HeapEntry {
                    key,
                    source,
                    payload,
                });
            }
            None if source == 0 => self.first_live = false,
            None => {}
        }
        Ok(())
    }

    fn initialize(&mut self) -> CoreResult<()> {
        if self.initialized {
            return Ok(());
        }
        self.initialized = true;
        (0..self.sources.len()).try_for_each(|source| self.pull(source))
    }

    /// True once no key still to come can satisfy the operation.
    fn is_settled(&self) -> bool {
        match self.op {
            MergeOp::Union | MergeOp::SymmetricDifference => self.heap.is_empty(),
            // The heap holds one entry per live source.
            MergeOp::Intersection => self.heap.len() < self.sources.len(),
            MergeOp::Difference => !self.first_live,
        }
    }
}

impl<T: MergeItem> Cursor for MergeCursor<'_, T> {
    type Item = T::Merged;

    fn advance(&mut self) -> Option<CoreResult<T::Merged>> {
        if let Err(err) = self.initialize() {
            return Some(Err(err));
        }
        loop {
            if self.is_settled() {
                self.heap.clear();
                return None;
            }
            let head = self.heap.pop()?;
            let mut members = vec![(head.source, head.payload)];
            while self.heap.peek().is_some_and(|next| next.key == head.key) {
                if let Some(next) = self.heap.pop() {
                    members.push((next.source, next.payload));
                }
            }
            for source in members.iter().map(|&(source, _)| source) {
                if let Err(err) = self.pull(source) {
                    return Some(Err(err));
                }
            }
            if self.op.accepts(&members, self.sources.len()) {
                return Some(Ok(T::combine(head.key, members)));
            }
        }
    }
}

/// Collects sorted streams and combines them with a set operation.
///
/// Source positions follow push order; the first stream pushed is index 0,
/// which is the one [`MergeBuilder::difference`] keeps keys from.
///
/// # Example
///
/// ```rust
/// use ordex_core::{MergeBuilder, Set};
///
/// let a = Set::from_keys(["bar", "foo"]).unwrap();
/// let b = Set::from_keys(["baz", "foo"]).unwrap();
///
/// let mut merge = MergeBuilder::new();
/// merge.push(a.iter()).push(b.iter());
/// let keys: Vec<String> = merge.union().collect::<Result<_, _>>().unwrap();
/// assert_eq!(keys, ["bar", "baz", "foo"]);
/// ```
pub struct MergeBuilder<'a, T: MergeItem> {
    sources: Vec<Stream<'a, T>>,
}

impl<'a, T: MergeItem> MergeBuilder<'a, T> {
    /// Creates an empty merge.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Adds a source stream. Its index is the number of sources before it.
    pub fn push(&mut self, stream: Stream<'a, T>) -> &mut Self {
        self.sources.push(stream);
        self
    }

    /// Returns the number of sources pushed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns true if no source was pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Keys present in any source.
    #[must_use]
    pub fn union(self) -> Stream<'a, T::Merged> {
        self.build(MergeOp::Union)
    }

    /// Keys present in every source.
    #[must_use]
    pub fn intersection(self) -> Stream<'a, T::Merged> {
        self.build(MergeOp::Intersection)
    }

    /// Keys present in the first source and in none of the others.
    #[must_use]
    pub fn difference(self) -> Stream<'a, T::Merged> {
        self.build(MergeOp::Difference)
    }

    /// Keys present in exactly one source.
    #[must_use]
    pub fn symmetric_difference(self) -> Stream<'a, T::Merged> {
        self.build(MergeOp::SymmetricDifference)
    }

    /// Combines the sources with `op`.
    #[must_use]
    pub fn build(self, op: MergeOp) -> Stream<'a, T::Merged> {
        tracing::debug!(%op, sources = self.sources.len(), "merging streams");
        if self.sources.is_empty() {
            return Stream::empty();
        }
        Stream::new(MergeCursor::new(op, self.sources))
    }
}

impl<T: MergeItem> Default for MergeBuilder<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: MergeItem> Extend<Stream<'a, T>> for MergeBuilder<'a, T> {
    fn extend<I: IntoIterator<Item = Stream<'a, T>>>(&mut self, iter: I) {
        self.sources.extend(iter);
    }
}

impl<'a, T: MergeItem> FromIterator<Stream<'a, T>> for MergeBuilder<'a, T> {
    fn from_iter<I: IntoIterator<Item = Stream<'a, T>>>(iter: I) -> Self {
        Self {
            sources: iter.into_iter().collect(),
        }
    }
}

impl<T: MergeItem> fmt::Debug for MergeBuilder<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeBuilder")
            .field("sources", &self.sources.len())
            .finish()
    }
}
