//! Pipeline stages and their sequential composition.

use std::sync::Arc;

use crate::cursor::BoxedCursor;
use crate::model::QueryItem;

mod add;
mod expand;
mod filter;
mod last;
mod slice;
mod support;
mod unique;

pub(crate) use add::AddStage;
pub(crate) use expand::{Axis, ExpandStage, Reach};
pub(crate) use filter::FilterStage;
pub(crate) use last::LastStage;
pub(crate) use slice::SliceStage;
pub(crate) use support::{Correlation, SupportStage};
pub(crate) use unique::UniqueStage;

/// A transform from one tagged-option stream to another.
///
/// `apply` only wires cursors together; no element is pulled until the returned cursor is.
pub trait Stage<T: QueryItem>: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, input: BoxedCursor<T>) -> BoxedCursor<T>;
}

pub type SharedStage<T> = Arc<dyn Stage<T>>;

/// Applies its stages in order: `s0` to the source, `s1` to the output of `s0`, and so on.
pub struct Composite<T: QueryItem> {
    stages: Arc<[SharedStage<T>]>,
}

impl<T: QueryItem> Composite<T> {
    pub fn new(stages: impl Into<Arc<[SharedStage<T>]>>) -> Self {
        Self { stages: stages.into() }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl<T: QueryItem> Clone for Composite<T> {
    fn clone(&self) -> Self {
        Self { stages: Arc::clone(&self.stages) }
    }
}

impl<T: QueryItem> Stage<T> for Composite<T> {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn apply(&self, input: BoxedCursor<T>) -> BoxedCursor<T> {
        self.stages.iter().fold(input, |cursor, stage| stage.apply(cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{collect_options, from_options};
    use crate::matcher::Matcher;
    use crate::option::TaggedOption as O;
    use rstest::rstest;

    fn keep(f: fn(&u32) -> bool) -> SharedStage<u32> {
        Arc::new(FilterStage::new(Matcher::from_fn(f).bind(None), true))
    }

    #[rstest]
    fn empty_composite_is_identity() {
        let composite = Composite::<u32>::new(Vec::new());
        assert!(composite.is_empty());
        let mut out = composite.apply(from_options(vec![O::Value(1, 0), O::Empty(1)]));
        assert_eq!(collect_options(&mut out).unwrap(), vec![O::Value(1, 0), O::Empty(1)]);
    }

    #[rstest]
    fn stages_apply_in_order() {
        let stages: Vec<SharedStage<u32>> =
            vec![keep(|v| *v > 1), Arc::new(SliceStage::new(0, Some(0))), keep(|v| *v % 2 == 0)];
        let composite = Composite::new(stages);
        assert_eq!(composite.len(), 3);
        let mut out = composite.apply(from_options(vec![O::Value(1, 0), O::Value(3, 1), O::Value(4, 2)]));
        // slice picks 3 before the even filter sees it
        assert_eq!(collect_options(&mut out).unwrap(), vec![O::Empty(0), O::Empty(1)]);
    }
}
