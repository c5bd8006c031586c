//! Key range bounds applied to index stream builders.

use crate::error::{CoreError, CoreResult};
use fst::Automaton;
use std::ops::{Bound, Range, RangeFrom, RangeFull, RangeInclusive, RangeTo, RangeToInclusive};

/// A range of string keys.
///
/// Implemented for every std range over string-like keys (`"b".."f"`,
/// `"b"..=String::from("f")`, `..`) and for a pair of [`Bound`]s.
pub trait KeyRange {
    /// The lower bound.
    fn start_key(&self) -> Bound<&str>;

    /// The upper bound.
    fn end_key(&self) -> Bound<&str>;
}

fn as_str<S: AsRef<str>>(bound: Bound<&S>) -> Bound<&str> {
    bound.map(|key| key.as_ref())
}

impl<S: AsRef<str>> KeyRange for Range<S> {
    fn start_key(&self) -> Bound<&str> {
        Bound::Included(self.start.as_ref())
    }

    fn end_key(&self) -> Bound<&str> {
        Bound::Excluded(self.end.as_ref())
    }
}

impl<S: AsRef<str>> KeyRange for RangeInclusive<S> {
    fn start_key(&self) -> Bound<&str> {
        Bound::Included(self.start().as_ref())
    }

    fn end_key(&self) -> Bound<&str> {
        Bound::Included(self.end().as_ref())
    }
}

impl<S: AsRef<str>> KeyRange for RangeFrom<S> {
    fn start_key(&self) -> Bound<&str> {
        Bound::Included(self.start.as_ref())
    }

    fn end_key(&self) -> Bound<&str> {
        Bound::Unbounded
    }
}

impl<S: AsRef<str>> KeyRange for RangeTo<S> {
    fn start_key(&self) -> Bound<&str> {
        Bound::Unbounded
    }

    fn end_key(&self) -> Bound<&str> {
        Bound::Excluded(self.end.as_ref())
    }
}

impl<S: AsRef<str>> KeyRange for RangeToInclusive<S> {
    fn start_key(&self) -> Bound<&str> {
        Bound::Unbounded
    }

    fn end_key(&self) -> Bound<&str> {
        Bound::Included(self.end.as_ref())
    }
}

impl KeyRange for RangeFull {
    fn start_key(&self) -> Bound<&str> {
        Bound::Unbounded
    }

    fn end_key(&self) -> Bound<&str> {
        Bound::Unbounded
    }
}

impl<S: AsRef<str>> KeyRange for (Bound<S>, Bound<S>) {
    fn start_key(&self) -> Bound<&str> {
        as_str(self.0.as_ref())
    }

    fn end_key(&self) -> Bound<&str> {
        as_str(self.1.as_ref())
    }
}

impl<R: KeyRange + ?Sized> KeyRange for &R {
    fn start_key(&self) -> Bound<&str> {
        (**self).start_key()
    }

    fn end_key(&self) -> Bound<&str> {
        (**self).end_key()
    }
}

/// The bound setters shared by set and map stream builders.
pub(crate) trait Bounded: Sized {
    fn ge(self, key: &str) -> Self;
    fn gt(self, key: &str) -> Self;
    fn le(self, key: &str) -> Self;
    fn lt(self, key: &str) -> Self;
}

impl<'s, A: Automaton> Bounded for fst::set::StreamBuilder<'s, A> {
    fn ge(self, key: &str) -> Self {
        fst::set::StreamBuilder::ge(self, key)
    }

    fn gt(self, key: &str) -> Self {
        fst::set::StreamBuilder::gt(self, key)
    }

    fn le(self, key: &str) -> Self {
        fst::set::StreamBuilder::le(self, key)
    }

    fn lt(self, key: &str) -> Self {
        fst::set::StreamBuilder::lt(self, key)
    }
}

impl<'m, A: Automaton> Bounded for fst::map::StreamBuilder<'m, A> {
    fn ge(self, key: &str) -> Self {
        fst::map::StreamBuilder::ge(self, key)
    }

    fn gt(self, key: &str) -> Self {
        fst::map::StreamBuilder::gt(self, key)
    }

    fn le(self, key: &str) -> Self {
        fst::map::StreamBuilder::le(self, key)
    }

    fn lt(self, key: &str) -> Self {
        fst::map::StreamBuilder::lt(self, key)
    }
}

/// Rejects ranges whose start lies after their end.
pub(crate) fn validate<R>(range: &R) -> CoreResult<()>
where
    R: KeyRange + ?Sized,
{
    let start = match range.start_key() {
        Bound::Included(key) | Bound::Excluded(key) => key,
        Bound::Unbounded => return Ok(()),
    };
    let end = match range.end_key() {
        Bound::Included(key) | Bound::Excluded(key) => key,
        Bound::Unbounded => return Ok(()),
    };
    if start > end {
        return Err(CoreError::InvalidRange {
            start: start.to_owned(),
            end: end.to_owned(),
        });
    }
    Ok(())
}

/// Validates `range` and narrows `builder` to it.
pub(crate) fn apply<B, R>(builder: B, range: &R) -> CoreResult<B>
where
    B: Bounded,
    R: KeyRange + ?Sized,
{
    validate(range)?;
    let builder = match range.start_key() {
        Bound::Included(key) => builder.ge(key),
        Bound::Excluded(key) => builder.gt(key),
        Bound::Unbounded => builder,
    };
    let builder = match range.end_key() {
        Bound::Included(key) => builder.le(key),
        Bound::Excluded(key) => builder.lt(key),
        Bound::Unbounded => builder,
    };
    Ok(builder)
}
