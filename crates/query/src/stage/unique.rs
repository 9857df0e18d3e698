use std::collections::HashSet;

use crate::cursor::{BoxedCursor, OptionCursor, OptionResult};
use crate::model::QueryItem;
use crate::option::TaggedOption;

use super::Stage;

/// Streaming de-duplication: repeats of an already seen value become `Empty` at their id.
pub(crate) struct UniqueStage;

impl<T: QueryItem> Stage<T> for UniqueStage {
    fn name(&self) -> &'static str {
        "unique"
    }

    fn apply(&self, input: BoxedCursor<T>) -> BoxedCursor<T> {
        Box::new(UniqueCursor { input, seen: Some(HashSet::new()) })
    }
}

struct UniqueCursor<T> {
    input: BoxedCursor<T>,
    // released once the upstream is exhausted
    seen: Option<HashSet<T>>,
}

impl<T: QueryItem> OptionCursor<T> for UniqueCursor<T> {
    fn next_option(&mut self) -> Option<OptionResult<T>> {
        let seen = self.seen.as_mut()?;
        let Some(item) = self.input.next_option() else {
            tracing::trace!(distinct = seen.len(), "unique released seen-set");
            self.seen = None;
            return None;
        };
        match item {
            Ok(TaggedOption::Value(v, id)) => {
                if seen.insert(v.clone()) {
                    Some(Ok(TaggedOption::Value(v, id)))
                } else {
                    Some(Ok(TaggedOption::Empty(id)))
                }
            }
            other => Some(other),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.input.size_hint()
    }
}
