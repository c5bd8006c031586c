//! Lazy, single-pass streams over index entries.
//!
//! Every read path (full iteration, ranges, searches, set algebra) returns a
//! [`Stream`]. A stream owns exactly one upstream cursor and drops it the
//! moment the stream is exhausted, fails, is closed or is itself dropped, so
//! the cursor (and any automaton it drives) is released exactly once.

use crate::error::{CoreError, CoreResult};
use fst::Streamer;
use std::fmt;
use std::iter::FusedIterator;
use std::mem;

/// A source of entries pulled one at a time by a [`Stream`].
pub(crate) trait Cursor {
    /// The element produced.
    type Item;

    /// Produces the next element, an error, or `None` at the end.
    fn advance(&mut self) -> Option<CoreResult<Self::Item>>;
}

type BoxCursor<'a, T> = Box<dyn Cursor<Item = T> + 'a>;

enum State<'a, T> {
    /// Nothing buffered; the next element comes from the cursor.
    Pending(BoxCursor<'a, T>),
    /// One element was pulled by [`Stream::peek`] and not yet returned.
    Ready(BoxCursor<'a, T>, T),
    /// Terminal. The cursor has been dropped.
    Exhausted,
}

/// A lazy, forward-only sequence of index entries.
///
/// Streams yield `CoreResult<T>` so that a decoding failure in the middle of
/// an index surfaces to the caller. After the first error, or after the last
/// element, the stream is exhausted and keeps returning `None`.
///
/// A stream borrows the container it came from (`'a`) and cannot outlive it.
/// It is not restartable; ask the container for a new one.
///
/// # Example
///
/// ```rust
/// use ordex_core::Set;
///
/// let set = Set::from_keys(["bar", "baz", "foo"]).unwrap();
/// let mut stream = set.iter();
/// assert_eq!(stream.peek().unwrap().unwrap(), "bar");
/// let keys: Vec<String> = stream.collect::<Result<_, _>>().unwrap();
/// assert_eq!(keys, ["bar", "baz", "foo"]);
/// ```
pub struct Stream<'a, T> {
    state: State<'a, T>,
}

impl<'a, T> Stream<'a, T> {
    pub(crate) fn new<C>(cursor: C) -> Self
    where
        C: Cursor<Item = T> + 'a,
    {
        Self {
            state: State::Pending(Box::new(cursor)),
        }
    }

    /// Returns a stream that yields nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            state: State::Exhausted,
        }
    }

    /// Returns the next element without consuming it.
    pub fn peek(&mut self) -> Option<CoreResult<&T>> {
        if let State::Pending(_) = self.state {
            if let State::Pending(mut cursor) = mem::replace(&mut self.state, State::Exhausted) {
                match cursor.advance() {
                    Some(Ok(item)) => self.state = State::Ready(cursor, item),
                    Some(Err(err)) => return Some(Err(err)),
                    None => return None,
                }
            }
        }
        match &self.state {
            State::Ready(_, item) => Some(Ok(item)),
            _ => None,
        }
    }

    /// Returns true once the stream can yield nothing more.
    ///
    /// A stream that has not been advanced past its last element yet still
    /// reports `false`; exhaustion is only known after the cursor says so.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, State::Exhausted)
    }

    /// Releases the cursor now. Further calls to `next` return `None`.
    pub fn close(&mut self) {
        self.state = State::Exhausted;
    }

    fn advance(&mut self) -> Option<CoreResult<T>> {
        match mem::replace(&mut self.state, State::Exhausted) {
            State::Exhausted => None,
            State::Ready(cursor, item) => {
                self.state = State::Pending(cursor);
                Some(Ok(item))
            }
            State::Pending(mut cursor) => match cursor.advance() {
                Some(Ok(item)) => {
                    self.state = State::Pending(cursor);
                    Some(Ok(item))
                }
                Some(Err(err)) => {
                    tracing::debug!(error = %err, "stream terminated by error");
                    Some(Err(err))
                }
                None => None,
            },
        }
    }
}

impl<T> Iterator for Stream<'_, T> {
    type Item = CoreResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}

impl<T> FusedIterator for Stream<'_, T> {}

impl<T> fmt::Debug for Stream<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::Pending(_) => "Pending",
            State::Ready(..) => "Ready",
            State::Exhausted => "Exhausted",
        };
        f.debug_struct("Stream").field("state", &state).finish()
    }
}

pub(crate) fn decode_key(bytes: &[u8]) -> CoreResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|err| CoreError::corrupt_index(format!("key is not valid UTF-8: {err}")))
}

/// Adapts an fst key streamer (set streams, map key streams).
pub(crate) struct KeyCursor<S> {
    inner: S,
}

impl<S> KeyCursor<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S> Cursor for KeyCursor<S>
where
    S: for<'b> Streamer<'b, Item = &'b [u8]>,
{
    type Item = String;

    fn advance(&mut self) -> Option<CoreResult<String>> {
        self.inner.next().map(decode_key)
    }
}

/// Adapts an fst map streamer yielding key/value pairs.
pub(crate) struct EntryCursor<S> {
    inner: S,
}

impl<S> EntryCursor<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S> Cursor for EntryCursor<S>
where
    S: for<'b> Streamer<'b, Item = (&'b [u8], u64)>,
{
    type Item = (String, u64);

    fn advance(&mut self) -> Option<CoreResult<(String, u64)>> {
        self.inner
            .next()
            .map(|(key, value)| decode_key(key).map(|key| (key, value)))
    }
}

/// Adapts an fst map value streamer.
pub(crate) struct ValueCursor<S> {
    inner: S,
}

impl<S> ValueCursor<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S> Cursor for ValueCursor<S>
where
    S: for<'b> Streamer<'b, Item = u64>,
{
    type Item = u64;

    fn advance(&mut self) -> Option<CoreResult<u64>> {
        self.inner.next().map(Ok)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Cursor over a fixed list that counts how often it is dropped.
    pub(crate) struct CountingCursor {
        items: std::vec::IntoIter<CoreResult<String>>,
        drops: Rc<Cell<usize>>,
    }

    impl CountingCursor {
        pub(crate) fn new(items: Vec<CoreResult<String>>, drops: Rc<Cell<usize>>) -> Self {
            Self {
                items: items.into_iter(),
                drops,
            }
        }
    }

    impl Cursor for CountingCursor {
        type Item = String;

        fn advance(&mut self) -> Option<CoreResult<String>> {
            self.items.next()
        }
    }

    impl Drop for CountingCursor {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    fn keys(list: &[&str]) -> Vec<CoreResult<String>> {
        list.iter().map(|k| Ok((*k).to_string())).collect()
    }

    #[test]
    fn yields_in_order_then_exhausts() {
        let drops = Rc::new(Cell::new(0));
        let mut stream = Stream::new(CountingCursor::new(keys(&["a", "b"]), drops.clone()));

        assert_eq!(stream.next().unwrap().unwrap(), "a");
        assert_eq!(stream.next().unwrap().unwrap(), "b");
        assert_eq!(drops.get(), 0);

        assert!(stream.next().is_none());
        assert!(stream.is_exhausted());
        assert_eq!(drops.get(), 1);

        // Exhaustion is idempotent and never releases twice.
        assert!(stream.next().is_none());
        drop(stream);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn early_drop_releases_once() {
        let drops = Rc::new(Cell::new(0));
        for _ in 0..100 {
            let mut stream =
                Stream::new(CountingCursor::new(keys(&["a", "b", "c"]), drops.clone()));
            assert!(stream.next().is_some());
        }
        assert_eq!(drops.get(), 100);
    }

    #[test]
    fn close_releases_immediately() {
        let drops = Rc::new(Cell::new(0));
        let mut stream = Stream::new(CountingCursor::new(keys(&["a"]), drops.clone()));

        stream.close();
        assert_eq!(drops.get(), 1);
        assert!(stream.next().is_none());
        stream.close();
        drop(stream);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn error_terminates_and_releases() {
        let drops = Rc::new(Cell::new(0));
        let items = vec![
            Ok("a".to_string()),
            Err(CoreError::corrupt_index("bad key")),
            Ok("c".to_string()),
        ];
        let mut stream = Stream::new(CountingCursor::new(items, drops.clone()));

        assert!(stream.next().unwrap().is_ok());
        assert!(stream.next().unwrap().is_err());
        assert_eq!(drops.get(), 1);
        assert!(stream.next().is_none());
    }

    #[test]
    fn peek_does_not_consume() {
        let drops = Rc::new(Cell::new(0));
        let mut stream = Stream::new(CountingCursor::new(keys(&["a", "b"]), drops.clone()));

        assert_eq!(stream.peek().unwrap().unwrap(), "a");
        assert_eq!(stream.peek().unwrap().unwrap(), "a");
        assert_eq!(stream.next().unwrap().unwrap(), "a");
        assert_eq!(stream.next().unwrap().unwrap(), "b");
        assert!(stream.peek().is_none());
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn empty_stream_yields_nothing() {
        let mut stream: Stream<'_, String> = Stream::empty();
        assert!(stream.is_exhausted());
        assert!(stream.peek().is_none());
        assert!(stream.next().is_none());
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        assert_eq!(decode_key(b"ok").unwrap(), "ok");
        let err = decode_key(&[0xff, 0xfe]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::CorruptIndex);
    }
}
