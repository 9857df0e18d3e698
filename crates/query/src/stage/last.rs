use crate::cursor::{BoxedCursor, OptionCursor, OptionResult};
use crate::model::QueryItem;
use crate::option::TaggedOption;

use super::Stage;

/// Reduces the stream to its final value.
///
/// This cannot short-circuit: a held candidate is only known to be the last one after the
/// upstream has been drained. Superseded candidates come out as `Empty` at their own id.
pub(crate) struct LastStage;

impl<T: QueryItem> Stage<T> for LastStage {
    fn name(&self) -> &'static str {
        "last"
    }

    fn apply(&self, input: BoxedCursor<T>) -> BoxedCursor<T> {
        Box::new(LastCursor { input, held: None, drained: false })
    }
}

struct LastCursor<T> {
    input: BoxedCursor<T>,
    // most recent value and its id
    held: Option<(T, usize)>,
    drained: bool,
}

impl<T> OptionCursor<T> for LastCursor<T> {
    fn next_option(&mut self) -> Option<OptionResult<T>> {
        if self.drained {
            return None;
        }
        loop {
            match self.input.next_option() {
                None => {
                    self.drained = true;
                    let (v, id) = self.held.take()?;
                    tracing::trace!(id, "last resolved final candidate");
                    return Some(Ok(TaggedOption::Value(v, id)));
                }
                Some(Err(e)) => return Some(Err(e)),
                // Gaps behind a held candidate are dropped to keep ids non-decreasing.
                Some(Ok(TaggedOption::Empty(id))) => {
                    if self.held.is_none() {
                        return Some(Ok(TaggedOption::Empty(id)));
                    }
                }
                Some(Ok(TaggedOption::Value(v, id))) => {
                    if let Some((_, prev)) = self.held.replace((v, id)) {
                        return Some(Ok(TaggedOption::Empty(prev)));
                    }
                }
            }
        }
    }
}
