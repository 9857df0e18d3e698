use crate::cursor::{BoxedCursor, OptionCursor, OptionResult};
use crate::matcher::{BoundMatcher, LazyPredicate};
use crate::model::QueryItem;
use crate::option::TaggedOption;

use super::Stage;

/// Keeps values whose test result equals `keep`; the rest become `Empty` at their id.
pub(crate) struct FilterStage<T: QueryItem> {
    matcher: BoundMatcher<T>,
    keep: bool,
}

impl<T: QueryItem> FilterStage<T> {
    pub(crate) fn new(matcher: BoundMatcher<T>, keep: bool) -> Self {
        Self { matcher, keep }
    }
}

impl<T: QueryItem> Stage<T> for FilterStage<T> {
    fn name(&self) -> &'static str {
        if self.keep { "filter" } else { "not" }
    }

    fn apply(&self, input: BoxedCursor<T>) -> BoxedCursor<T> {
        Box::new(FilterCursor { input, test: self.matcher.lazy(), keep: self.keep })
    }
}

struct FilterCursor<T: QueryItem> {
    input: BoxedCursor<T>,
    test: LazyPredicate<T>,
    keep: bool,
}

impl<T: QueryItem> OptionCursor<T> for FilterCursor<T> {
    fn next_option(&mut self) -> Option<OptionResult<T>> {
        let item = match self.input.next_option()? {
            Ok(TaggedOption::Value(v, id)) => match self.test.test(&v) {
                Ok(hit) if hit == self.keep => TaggedOption::Value(v, id),
                Ok(_) => TaggedOption::Empty(id),
                Err(e) => return Some(Err(e)),
            },
            other => return Some(other),
        };
        Some(Ok(item))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.input.size_hint()
    }
}
