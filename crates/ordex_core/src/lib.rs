//! # Ordex Core
//!
//! Immutable ordered string sets and maps over a finite state index.
//!
//! This crate provides:
//! - [`Set`] and [`Map`], loaded from files or built in memory
//! - [`SetBuilder`] and [`MapBuilder`] for write-once construction
//! - Lazy [`Stream`]s for iteration, ranges and searches
//! - Fuzzy (edit distance) and pattern search
//! - Set algebra across any number of sources via [`MergeBuilder`]
//! - [`UnionSet`], a merged view over several sets
//!
//! Containers are immutable once built, so they can be shared freely
//! between threads. Streams borrow the container they read from.
//!
//! ## Example
//!
//! ```rust
//! use ordex_core::{Map, Set};
//!
//! let a = Set::from_keys(["bar", "foo"]).unwrap();
//! let b = Set::from_keys(["baz", "foo"]).unwrap();
//! let both: Vec<String> = a.intersection(&[&b]).collect::<Result<_, _>>().unwrap();
//! assert_eq!(both, ["foo"]);
//!
//! let map = Map::from_entries([("bar", 1), ("foo", 2)]).unwrap();
//! assert_eq!(map.get("foo").unwrap(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod error;
mod map;
mod merge;
mod range;
mod search;
mod set;
mod stream;
mod union_set;

pub use builder::{MapBuilder, SetBuilder};
pub use config::Config;
pub use error::{CoreError, CoreResult, ErrorKind};
pub use fst::Automaton;
pub use map::{Map, MergedEntry};
pub use merge::{IndexedValue, MergeBuilder, MergeItem, MergeOp};
pub use ordex_storage::OpenMode;
pub use range::KeyRange;
pub use search::MAX_FUZZY_DISTANCE;
pub use set::Set;
pub use stream::Stream;
pub use union_set::UnionSet;
