//! Boundary adapters between plain element sequences and tagged-option streams.

use std::sync::Arc;

use crate::cursor::{BoxedCursor, OptionCursor, OptionResult};
use crate::error::QueryError;
use crate::option::TaggedOption;

/// Seeds the id domain: the i-th initial element becomes `Value(elem, i)`.
pub struct Decorate<T> {
    items: Arc<[T]>,
    pos: usize,
}

impl<T> Decorate<T> {
    pub fn new(items: Arc<[T]>) -> Self {
        Self { items, pos: 0 }
    }
}

impl<T: Clone> OptionCursor<T> for Decorate<T> {
    fn next_option(&mut self) -> Option<OptionResult<T>> {
        let item = self.items.get(self.pos)?.clone();
        let id = self.pos;
        self.pos += 1;
        Some(Ok(TaggedOption::Value(item, id)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.items.len().saturating_sub(self.pos);
        (rest, Some(rest))
    }
}

/// Drops `Empty` entries; values and errors pass through in order.
pub struct DropEmpty<T> {
    inner: BoxedCursor<T>,
}

impl<T> DropEmpty<T> {
    pub fn new(inner: BoxedCursor<T>) -> Self {
        Self { inner }
    }
}

impl<T> OptionCursor<T> for DropEmpty<T> {
    fn next_option(&mut self) -> Option<OptionResult<T>> {
        loop {
            match self.inner.next_option()? {
                Ok(TaggedOption::Empty(_)) => continue,
                other => return Some(other),
            }
        }
    }
}

/// Unwraps values. Expects a stream that already went through [`DropEmpty`].
pub struct Strip<T> {
    inner: BoxedCursor<T>,
}

impl<T> Strip<T> {
    pub fn new(inner: BoxedCursor<T>) -> Self {
        Self { inner }
    }
}

impl<T> Iterator for Strip<T> {
    type Item = Result<T, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next_option()? {
                Ok(TaggedOption::Value(v, _)) => return Some(Ok(v)),
                // never produced behind DropEmpty
                Ok(TaggedOption::Empty(_)) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
