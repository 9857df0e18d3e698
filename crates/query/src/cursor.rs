//! Pull-based cursor contract every pipeline stage is built from.

use crate::error::QueryError;
use crate::option::TaggedOption;

pub type OptionResult<T> = Result<TaggedOption<T>, QueryError>;

/// Single-step producer of tagged options.
///
/// `next_option` returns exactly one entry (or `None` at the end) and may pull any number of
/// entries from its own upstream to do so. Implementations must never drain their upstream
/// ahead of demand.
pub trait OptionCursor<T> {
    fn next_option(&mut self) -> Option<OptionResult<T>>;

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, None)
    }
}

pub type BoxedCursor<T> = Box<dyn OptionCursor<T>>;

impl<T> OptionCursor<T> for BoxedCursor<T> {
    fn next_option(&mut self) -> Option<OptionResult<T>> {
        (**self).next_option()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (**self).size_hint()
    }
}

/// One-element lookahead over a cursor, giving the "has more / take next" protocol.
///
/// The upstream is not polled again once it has reported its end.
pub struct Lookahead<T> {
    inner: BoxedCursor<T>,
    buffered: Option<OptionResult<T>>,
    finished: bool,
}

impl<T> Lookahead<T> {
    pub fn new(inner: BoxedCursor<T>) -> Self {
        Self { inner, buffered: None, finished: false }
    }

    fn fill(&mut self) {
        if self.buffered.is_none() && !self.finished {
            self.buffered = self.inner.next_option();
            if self.buffered.is_none() {
                self.finished = true;
            }
        }
    }

    pub fn peek(&mut self) -> Option<&OptionResult<T>> {
        self.fill();
        self.buffered.as_ref()
    }

    /// Id of the buffered entry, if it is an `Ok` entry.
    pub fn peek_id(&mut self) -> Option<usize> {
        match self.peek() {
            Some(Ok(opt)) => Some(opt.id()),
            _ => None,
        }
    }

    pub fn has_next(&mut self) -> bool {
        self.peek().is_some()
    }

    pub fn take_next(&mut self) -> Option<OptionResult<T>> {
        self.fill();
        self.buffered.take()
    }
}

impl<T> OptionCursor<T> for Lookahead<T> {
    fn next_option(&mut self) -> Option<OptionResult<T>> {
        self.take_next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let extra = usize::from(self.buffered.is_some());
        if self.finished {
            return (extra, Some(extra));
        }
        let (lo, hi) = self.inner.size_hint();
        (lo.saturating_add(extra), hi.and_then(|h| h.checked_add(extra)))
    }
}

/// Cursor over any iterator of results; handy for feeding prepared sequences into a stage.
pub struct IterCursor<I> {
    iter: I,
}

impl<I> IterCursor<I> {
    pub fn new(iter: I) -> Self {
        Self { iter }
    }
}

impl<T, I> OptionCursor<T> for IterCursor<I>
where
    I: Iterator<Item = OptionResult<T>>,
{
    fn next_option(&mut self) -> Option<OptionResult<T>> {
        self.iter.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

/// Box a prepared list of tagged options as a cursor.
pub fn from_options<T: 'static>(options: Vec<TaggedOption<T>>) -> BoxedCursor<T> {
    Box::new(IterCursor::new(options.into_iter().map(Ok::<_, QueryError>)))
}

/// Drain a cursor into a vector. Stops at and returns the first error.
pub fn collect_options<T>(cursor: &mut dyn OptionCursor<T>) -> Result<Vec<TaggedOption<T>>, QueryError> {
    let mut out = Vec::new();
    while let Some(item) = cursor.next_option() {
        out.push(item?);
    }
    Ok(out)
}
