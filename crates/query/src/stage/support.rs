//! Folds a nested pipeline over a larger candidate domain back onto the outer elements.
//!
//! Outer entries are fed to the nested pipeline through [`ResetIds`], which renumbers them
//! `0, 1, 2, ...` and parks the original entry in a shared window. The nested output is then
//! grouped by that fresh id: every run of ids equal to `k` is the candidate set for outer
//! entry `k`. [`SupportCursor`] walks those runs in a single forward pass and emits one
//! verdict per outer entry.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::cursor::{BoxedCursor, Lookahead, OptionCursor, OptionResult};
use crate::model::QueryItem;
use crate::option::TaggedOption;

use super::{Composite, Stage};

/// What to emit for an outer entry whose run contains a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Correlation {
    /// The outer element itself (existence test, `has`).
    Support,
    /// The first value of the run, at the outer id (`closest`).
    FirstMatch,
}

pub(crate) struct SupportStage<T: QueryItem> {
    nested: Composite<T>,
    mode: Correlation,
}

impl<T: QueryItem> SupportStage<T> {
    pub(crate) fn new(nested: Composite<T>, mode: Correlation) -> Self {
        Self { nested, mode }
    }
}

impl<T: QueryItem> Stage<T> for SupportStage<T> {
    fn name(&self) -> &'static str {
        match self.mode {
            Correlation::Support => "has",
            Correlation::FirstMatch => "closest",
        }
    }

    fn apply(&self, input: BoxedCursor<T>) -> BoxedCursor<T> {
        let window = Rc::new(RefCell::new(Window { source: input, pending: VecDeque::new(), next_id: 0 }));
        let feeder: BoxedCursor<T> = Box::new(ResetIds { window: Rc::clone(&window) });
        let nested = Lookahead::new(self.nested.apply(feeder));
        Box::new(SupportCursor { window, nested, current: 0, mode: self.mode })
    }
}

/// Outer entries handed to the nested pipeline but not judged yet.
struct Window<T> {
    source: BoxedCursor<T>,
    pending: VecDeque<TaggedOption<T>>,
    // fresh id of the next outer entry
    next_id: usize,
}

impl<T> Window<T> {
    fn pull(&mut self) -> Option<OptionResult<T>> {
        let item = self.source.next_option()?;
        if item.is_ok() {
            self.next_id += 1;
        }
        Some(item)
    }
}

/// Feeds outer entries into the nested pipeline with fresh, gapless ids starting at 0.
struct ResetIds<T> {
    window: Rc<RefCell<Window<T>>>,
}

impl<T: Clone> OptionCursor<T> for ResetIds<T> {
    fn next_option(&mut self) -> Option<OptionResult<T>> {
        let mut window = self.window.borrow_mut();
        let id = window.next_id;
        let original = match window.pull()? {
            Ok(opt) => opt,
            Err(e) => return Some(Err(e)),
        };
        let fresh = original.clone().with_id(id);
        window.pending.push_back(original);
        Some(Ok(fresh))
    }
}

struct SupportCursor<T> {
    window: Rc<RefCell<Window<T>>>,
    nested: Lookahead<T>,
    // fresh id of the outer entry being judged
    current: usize,
    mode: Correlation,
}

impl<T: Clone> OptionCursor<T> for SupportCursor<T> {
    fn next_option(&mut self) -> Option<OptionResult<T>> {
        let mut first: Option<T> = None;
        // Consume the run for `current`; stale ids below it are skipped.
        loop {
            let id = match self.nested.peek() {
                Some(Ok(opt)) => opt.id(),
                Some(Err(_)) => return self.nested.take_next(),
                None => break,
            };
            if id > self.current {
                break;
            }
            if let Some(Ok(opt)) = self.nested.take_next()
                && first.is_none()
                && id == self.current
            {
                first = opt.into_value();
            }
        }

        let original = {
            let mut window = self.window.borrow_mut();
            match window.pending.pop_front() {
                Some(original) => original,
                // The nested pipeline stopped pulling early; judge the remaining entries directly.
                None => match window.pull() {
                    Some(Ok(original)) => original,
                    Some(Err(e)) => return Some(Err(e)),
                    None => {
                        tracing::trace!(judged = self.current, stage = "support", "correlation finished");
                        return None;
                    }
                },
            }
        };
        self.current += 1;

        let verdict = match (first, original) {
            (Some(hit), TaggedOption::Value(v, id)) => match self.mode {
                Correlation::Support => TaggedOption::Value(v, id),
                Correlation::FirstMatch => TaggedOption::Value(hit, id),
            },
            (_, original) => original.to_empty(),
        };
        Some(Ok(verdict))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{IterCursor, collect_options, from_options};
    use crate::error::QueryError;
    use crate::option::TaggedOption as O;
    use rstest::rstest;
    use std::sync::Arc;

    /// Nested stage built from a fixed candidate table: entry `k` expands to `table[k]`,
    /// where `None` marks an empty candidate.
    struct Table(Vec<Vec<Option<&'static str>>>);

    impl Stage<&'static str> for Table {
        fn name(&self) -> &'static str {
            "table"
        }

        fn apply(&self, input: BoxedCursor<&'static str>) -> BoxedCursor<&'static str> {
            let table = self.0.clone();
            let mut input = input;
            let mut queue: VecDeque<O<&'static str>> = VecDeque::new();
            Box::new(IterCursor::new(std::iter::from_fn(move || {
                loop {
                    if let Some(next) = queue.pop_front() {
                        return Some(Ok::<_, QueryError>(next));
                    }
                    let item = match input.next_option()? {
                        Ok(item) => item,
                        Err(e) => return Some(Err(e)),
                    };
                    let id = item.id();
                    match item {
                        O::Value(..) => {
                            for cand in table.get(id).cloned().unwrap_or_default() {
                                queue.push_back(cand.map_or(O::Empty(id), |c| O::Value(c, id)));
                            }
                        }
                        O::Empty(_) => queue.push_back(O::Empty(id)),
                    }
                }
            })))
        }
    }

    fn run(table: Vec<Vec<Option<&'static str>>>, mode: Correlation, input: Vec<O<&'static str>>) -> Vec<O<&'static str>> {
        let stage = SupportStage::new(Composite::new(vec![Arc::new(Table(table)) as Arc<dyn Stage<_>>]), mode);
        let mut out = stage.apply(from_options(input));
        collect_options(&mut out).unwrap()
    }

    #[rstest]
    fn one_verdict_per_outer_entry() {
        // A -> [A1 hit], B -> [], C -> [C1 miss, C2 hit]
        let table = vec![vec![Some("A1")], vec![], vec![None, Some("C2")]];
        let out = run(table, Correlation::Support, vec![O::Value("A", 0), O::Value("B", 1), O::Value("C", 2)]);
        assert_eq!(out, vec![O::Value("A", 0), O::Empty(1), O::Value("C", 2)]);
    }

    #[rstest]
    fn verdicts_keep_original_ids() {
        let table = vec![vec![Some("x")], vec![Some("y")], vec![None]];
        let out = run(table, Correlation::Support, vec![O::Value("A", 4), O::Empty(6), O::Value("C", 9)]);
        assert_eq!(out, vec![O::Value("A", 4), O::Empty(6), O::Empty(9)]);
    }

    #[rstest]
    fn first_match_reports_candidate() {
        let table = vec![vec![None, Some("p1"), Some("p2")], vec![None]];
        let out = run(table, Correlation::FirstMatch, vec![O::Value("A", 0), O::Value("B", 1)]);
        assert_eq!(out, vec![O::Value("p1", 0), O::Empty(1)]);
    }

    #[rstest]
    fn trailing_entries_without_candidates() {
        let table = vec![vec![Some("x")]];
        let out = run(table, Correlation::Support, vec![O::Value("A", 0), O::Value("B", 1), O::Value("C", 2)]);
        assert_eq!(out, vec![O::Value("A", 0), O::Empty(1), O::Empty(2)]);
    }

    #[rstest]
    fn early_stopping_nested_pipeline_still_judges_everything() {
        let nested = Composite::new(vec![
            Arc::new(Table(vec![vec![Some("x")], vec![Some("y")], vec![Some("z")]])) as Arc<dyn Stage<_>>,
            Arc::new(super::super::SliceStage::new(0, Some(0))),
        ]);
        let stage = SupportStage::new(nested, Correlation::Support);
        let mut out = stage.apply(from_options(vec![O::Value("A", 0), O::Value("B", 1), O::Value("C", 2)]));
        assert_eq!(collect_options(&mut out).unwrap(), vec![O::Value("A", 0), O::Empty(1), O::Empty(2)]);
    }

    #[rstest]
    fn empty_outer_domain() {
        assert!(run(vec![], Correlation::Support, vec![]).is_empty());
    }
}
