use crate::cursor::{BoxedCursor, OptionCursor, OptionResult};
use crate::model::QueryItem;
use crate::option::TaggedOption;

use super::Stage;

/// Keeps values whose position among the values seen so far lies in `from..=to`.
///
/// Bounds are validated by the query builder. Once the window is passed the upstream is no
/// longer pulled.
pub(crate) struct SliceStage {
    from: usize,
    to: Option<usize>,
}

impl SliceStage {
    pub(crate) fn new(from: usize, to: Option<usize>) -> Self {
        Self { from, to }
    }
}

impl<T: QueryItem> Stage<T> for SliceStage {
    fn name(&self) -> &'static str {
        "slice"
    }

    fn apply(&self, input: BoxedCursor<T>) -> BoxedCursor<T> {
        Box::new(SliceCursor { input, from: self.from, to: self.to, position: 0 })
    }
}

struct SliceCursor<T> {
    input: BoxedCursor<T>,
    from: usize,
    to: Option<usize>,
    // number of values seen so far
    position: usize,
}

impl<T> OptionCursor<T> for SliceCursor<T> {
    fn next_option(&mut self) -> Option<OptionResult<T>> {
        if self.to.is_some_and(|to| self.position > to) {
            return None;
        }
        match self.input.next_option()? {
            Ok(TaggedOption::Value(v, id)) => {
                let pos = self.position;
                self.position += 1;
                if pos < self.from { Some(Ok(TaggedOption::Empty(id))) } else { Some(Ok(TaggedOption::Value(v, id))) }
            }
            other => Some(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{IterCursor, collect_options, from_options};
    use crate::error::QueryError;
    use crate::option::TaggedOption as O;
    use rstest::rstest;
    use std::cell::Cell;
    use std::rc::Rc;

    #[rstest]
    fn window_counts_values_only() {
        let stage = SliceStage::new(1, Some(2));
        let mut out = stage.apply(from_options(vec![
            O::Value('a', 0),
            O::Empty(1),
            O::Value('b', 2),
            O::Value('c', 3),
            O::Value('d', 4),
        ]));
        assert_eq!(
            collect_options(&mut out).unwrap(),
            vec![O::Empty(0), O::Empty(1), O::Value('b', 2), O::Value('c', 3)]
        );
    }

    #[rstest]
    fn stops_pulling_after_window() {
        let pulls = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&pulls);
        let source = (0..).map(move |i| {
            counter.set(counter.get() + 1);
            Ok::<_, QueryError>(O::Value(i, i))
        });
        let stage = SliceStage::new(0, Some(0));
        let mut out = Stage::<usize>::apply(&stage, Box::new(IterCursor::new(source)));
        assert_eq!(collect_options(&mut out).unwrap(), vec![O::Value(0, 0)]);
        assert_eq!(pulls.get(), 1);
    }
}
