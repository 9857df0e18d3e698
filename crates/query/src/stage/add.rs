use std::sync::Arc;

use crate::cursor::{BoxedCursor, OptionCursor, OptionResult};
use crate::model::QueryItem;
use crate::option::TaggedOption;

use super::Stage;

/// Appends extra elements once the upstream is exhausted.
///
/// Added elements carry the last id seen upstream (0 if there was none) so the stream stays
/// non-decreasing.
pub(crate) struct AddStage<T> {
    items: Arc<[T]>,
}

impl<T> AddStage<T> {
    pub(crate) fn new(items: Arc<[T]>) -> Self {
        Self { items }
    }
}

impl<T: QueryItem> Stage<T> for AddStage<T> {
    fn name(&self) -> &'static str {
        "add"
    }

    fn apply(&self, input: BoxedCursor<T>) -> BoxedCursor<T> {
        Box::new(AddCursor { input: Some(input), items: Arc::clone(&self.items), pos: 0, last_id: 0 })
    }
}

struct AddCursor<T> {
    input: Option<BoxedCursor<T>>,
    items: Arc<[T]>,
    pos: usize,
    last_id: usize,
}

impl<T: Clone> OptionCursor<T> for AddCursor<T> {
    fn next_option(&mut self) -> Option<OptionResult<T>> {
        if let Some(input) = self.input.as_mut() {
            match input.next_option() {
                Some(item) => {
                    if let Ok(opt) = &item {
                        self.last_id = opt.id();
                    }
                    return Some(item);
                }
                None => self.input = None,
            }
        }
        let item = self.items.get(self.pos)?.clone();
        self.pos += 1;
        Some(Ok(TaggedOption::Value(item, self.last_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{collect_options, from_options};
    use crate::option::TaggedOption as O;
    use rstest::rstest;

    #[rstest]
    fn appends_after_upstream_with_last_id() {
        let stage = AddStage::new(Arc::from(vec!['x', 'y']));
        let mut out = stage.apply(from_options(vec![O::Value('a', 0), O::Empty(2)]));
        assert_eq!(
            collect_options(&mut out).unwrap(),
            vec![O::Value('a', 0), O::Empty(2), O::Value('x', 2), O::Value('y', 2)]
        );
    }

    #[rstest]
    fn empty_upstream_uses_id_zero() {
        let stage = AddStage::new(Arc::from(vec![1u8]));
        let mut out = stage.apply(from_options(Vec::new()));
        assert_eq!(collect_options(&mut out).unwrap(), vec![O::Value(1, 0)]);
    }
}
