//! Structural expansion: each value is replaced by the nodes reached along one axis.

use std::collections::VecDeque;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::cursor::{BoxedCursor, OptionCursor, OptionResult};
use crate::error::QueryError;
use crate::matcher::{BoundMatcher, LazyPredicate};
use crate::model::{QueryItem, SearchStrategy, TreeProvider};
use crate::option::TaggedOption;

use super::Stage;

/// How far a sibling or ancestor walk goes.
pub(crate) enum Reach<T: QueryItem> {
    One,
    All,
    /// Stop before the first node the matcher accepts.
    Until(BoundMatcher<T>),
}

pub(crate) enum Axis<T: QueryItem> {
    Children,
    Parent,
    /// All children of the parent, the node itself included.
    Siblings,
    Next(Reach<T>),
    /// Walks backward, nearest sibling first.
    Prev(Reach<T>),
    Parents(Reach<T>),
    AncestorsOrSelf,
    Descendants(SearchStrategy),
    /// Members of the list that are descendants of the node, in list order.
    DescendantsAmong(Arc<[T]>),
}

impl<T: QueryItem> Axis<T> {
    fn name(&self) -> &'static str {
        match self {
            Axis::Children => "children",
            Axis::Parent => "parent",
            Axis::Siblings => "siblings",
            Axis::Next(_) => "next",
            Axis::Prev(_) => "prev",
            Axis::Parents(_) => "parents",
            Axis::AncestorsOrSelf => "ancestors-or-self",
            Axis::Descendants(_) => "find",
            Axis::DescendantsAmong(_) => "find-among",
        }
    }

    fn reach(&self) -> Option<&Reach<T>> {
        match self {
            Axis::Next(r) | Axis::Prev(r) | Axis::Parents(r) => Some(r),
            _ => None,
        }
    }
}

pub(crate) struct ExpandStage<T: QueryItem> {
    axis: Arc<Axis<T>>,
    provider: Arc<dyn TreeProvider<T>>,
}

impl<T: QueryItem> ExpandStage<T> {
    pub(crate) fn new(axis: Axis<T>, provider: Arc<dyn TreeProvider<T>>) -> Self {
        Self { axis: Arc::new(axis), provider }
    }
}

impl<T: QueryItem> Stage<T> for ExpandStage<T> {
    fn name(&self) -> &'static str {
        self.axis.name()
    }

    fn apply(&self, input: BoxedCursor<T>) -> BoxedCursor<T> {
        let until = match self.axis.reach() {
            Some(Reach::Until(m)) => Some(m.lazy()),
            _ => None,
        };
        Box::new(ExpandCursor {
            input,
            axis: Arc::clone(&self.axis),
            provider: Arc::clone(&self.provider),
            until,
            walk: None,
        })
    }
}

struct ExpandCursor<T: QueryItem> {
    input: BoxedCursor<T>,
    axis: Arc<Axis<T>>,
    provider: Arc<dyn TreeProvider<T>>,
    until: Option<LazyPredicate<T>>,
    // walk for the value currently being expanded
    walk: Option<Walk<T>>,
}

impl<T: QueryItem> OptionCursor<T> for ExpandCursor<T> {
    fn next_option(&mut self) -> Option<OptionResult<T>> {
        loop {
            if let Some(walk) = self.walk.as_mut() {
                match walk.advance(&*self.provider, self.until.as_mut()) {
                    Ok(Some(node)) => return Some(Ok(TaggedOption::Value(node, walk.id))),
                    Ok(None) => {
                        let gap = (!walk.produced).then_some(TaggedOption::Empty(walk.id));
                        self.walk = None;
                        if let Some(gap) = gap {
                            return Some(Ok(gap));
                        }
                    }
                    Err(e) => {
                        self.walk = None;
                        return Some(Err(e));
                    }
                }
            }
            match self.input.next_option()? {
                Ok(TaggedOption::Value(node, id)) => match Walk::start(&self.axis, node, id, &*self.provider) {
                    Ok(walk) => self.walk = Some(walk),
                    Err(e) => return Some(Err(e)),
                },
                other => return Some(other),
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Limit {
    One,
    All,
    Until,
}

struct Walk<T> {
    id: usize,
    state: WalkState<T>,
    limit: Limit,
    produced: bool,
}

impl<T: QueryItem> Walk<T> {
    fn start(axis: &Axis<T>, node: T, id: usize, provider: &dyn TreeProvider<T>) -> Result<Self, QueryError> {
        let state = match axis {
            Axis::Children => WalkState::Listed(provider.children(&node)?.into_iter()),
            Axis::Parent => WalkState::Listed(provider.parent(&node)?.into_iter().collect::<Vec<_>>().into_iter()),
            Axis::Siblings => WalkState::Listed(provider.siblings(&node)?.into_iter()),
            Axis::Next(_) => {
                let mut siblings = provider.siblings(&node)?;
                let following = match siblings.iter().position(|s| s == &node) {
                    Some(pos) => siblings.split_off(pos + 1),
                    None => Vec::new(),
                };
                WalkState::Listed(following.into_iter())
            }
            Axis::Prev(_) => {
                let mut siblings = provider.siblings(&node)?;
                match siblings.iter().position(|s| s == &node) {
                    Some(pos) => siblings.truncate(pos),
                    None => siblings.clear(),
                }
                siblings.reverse();
                WalkState::Listed(siblings.into_iter())
            }
            Axis::Parents(_) => WalkState::Ancestors { last: node, include_self: false, started: false, done: false },
            Axis::AncestorsOrSelf => {
                WalkState::Ancestors { last: node, include_self: true, started: false, done: false }
            }
            Axis::Descendants(SearchStrategy::DepthFirst) => {
                WalkState::DepthFirst { stack: SmallVec::new(), pending: Some(node) }
            }
            Axis::Descendants(SearchStrategy::BreadthFirst) => {
                WalkState::BreadthFirst { queue: VecDeque::from([node]), current: Vec::new().into_iter() }
            }
            Axis::DescendantsAmong(members) => WalkState::Among { root: node, members: Arc::clone(members), pos: 0 },
        };
        let limit = match axis.reach() {
            Some(Reach::One) => Limit::One,
            Some(Reach::Until(_)) => Limit::Until,
            Some(Reach::All) | None => Limit::All,
        };
        Ok(Self { id, state, limit, produced: false })
    }

    fn advance(
        &mut self,
        provider: &dyn TreeProvider<T>,
        until: Option<&mut LazyPredicate<T>>,
    ) -> Result<Option<T>, QueryError> {
        let Some(node) = self.state.advance(provider)? else {
            return Ok(None);
        };
        match self.limit {
            Limit::One => self.state = WalkState::Done,
            Limit::Until => {
                if let Some(until) = until
                    && until.test(&node)?
                {
                    self.state = WalkState::Done;
                    return Ok(None);
                }
            }
            Limit::All => {}
        }
        self.produced = true;
        Ok(Some(node))
    }
}

enum WalkState<T> {
    Listed(std::vec::IntoIter<T>),
    // Parent chain; `last` is the most recently emitted node (or the start node)
    Ancestors {
        last: T,
        include_self: bool,
        started: bool,
        done: bool,
    },
    // Pre-order walk; children of `pending` are listed only when the next node is requested
    DepthFirst {
        stack: SmallVec<[std::vec::IntoIter<T>; 8]>,
        pending: Option<T>,
    },
    // Level-order walk; `queue` holds nodes whose children have not been listed yet
    BreadthFirst {
        queue: VecDeque<T>,
        current: std::vec::IntoIter<T>,
    },
    Among {
        root: T,
        members: Arc<[T]>,
        pos: usize,
    },
    Done,
}

impl<T: QueryItem> WalkState<T> {
    fn advance(&mut self, provider: &dyn TreeProvider<T>) -> Result<Option<T>, QueryError> {
        match self {
            WalkState::Listed(items) => Ok(items.next()),
            WalkState::Ancestors { last, include_self, started, done } => {
                if *done {
                    return Ok(None);
                }
                if !*started {
                    *started = true;
                    if *include_self {
                        return Ok(Some(last.clone()));
                    }
                }
                match provider.parent(last)? {
                    Some(parent) => {
                        *last = parent.clone();
                        Ok(Some(parent))
                    }
                    None => {
                        *done = true;
                        Ok(None)
                    }
                }
            }
            WalkState::DepthFirst { stack, pending } => {
                if let Some(node) = pending.take() {
                    stack.push(provider.children(&node)?.into_iter());
                }
                while let Some(top) = stack.last_mut() {
                    if let Some(next) = top.next() {
                        *pending = Some(next.clone());
                        return Ok(Some(next));
                    }
                    stack.pop();
                }
                Ok(None)
            }
            WalkState::BreadthFirst { queue, current } => loop {
                if let Some(next) = current.next() {
                    queue.push_back(next.clone());
                    return Ok(Some(next));
                }
                let Some(parent) = queue.pop_front() else {
                    return Ok(None);
                };
                *current = provider.children(&parent)?.into_iter();
            },
            WalkState::Among { root, members, pos } => {
                while let Some(candidate) = members.get(*pos) {
                    *pos += 1;
                    if provider.is_descendant(root, candidate)? {
                        return Ok(Some(candidate.clone()));
                    }
                }
                Ok(None)
            }
            WalkState::Done => Ok(None),
        }
    }
}
