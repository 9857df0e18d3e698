use core::fmt;
use std::sync::Arc;

use itertools::Itertools;

use crate::adapters::{Decorate, DropEmpty, Strip};
use crate::cursor::BoxedCursor;
use crate::error::QueryError;
use crate::matcher::{BoundMatcher, Matcher};
use crate::model::{QueryItem, SearchStrategy, SelectorCompiler, TreeProvider};
use crate::stage::{
    AddStage, Axis, Composite, Correlation, ExpandStage, FilterStage, LastStage, Reach, SharedStage, SliceStage, Stage,
    SupportStage, UniqueStage,
};

/// Settings shared by every query derived from one root query.
pub struct QueryConfig<T: QueryItem> {
    strategy: SearchStrategy,
    selectors: Option<Arc<dyn SelectorCompiler<T>>>,
}

impl<T: QueryItem> QueryConfig<T> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_selector_compiler(mut self, compiler: Arc<dyn SelectorCompiler<T>>) -> Self {
        self.selectors = Some(compiler);
        self
    }

    pub fn strategy(&self) -> SearchStrategy {
        self.strategy
    }

    pub fn selector_compiler(&self) -> Option<Arc<dyn SelectorCompiler<T>>> {
        self.selectors.as_ref().map(Arc::clone)
    }
}

impl<T: QueryItem> Default for QueryConfig<T> {
    fn default() -> Self {
        Self { strategy: SearchStrategy::default(), selectors: None }
    }
}

impl<T: QueryItem> Clone for QueryConfig<T> {
    fn clone(&self) -> Self {
        Self { strategy: self.strategy, selectors: self.selectors.clone() }
    }
}

impl<T: QueryItem> fmt::Debug for QueryConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryConfig")
            .field("strategy", &self.strategy)
            .field("selectors", &self.selectors.is_some())
            .finish()
    }
}

/// Immutable, lazily evaluated query over elements of a host tree.
///
/// Every builder method returns a new `Query` whose stage list is the receiver's plus one or
/// two appended stages; the receiver is left untouched. Nothing is evaluated until the query
/// is iterated, materialized or rendered.
///
/// ```
/// use platynui_query::simple::{SimpleTree, elem};
///
/// let root = elem("root")
///     .child(elem("item").attr("id", "1"))
///     .child(elem("other"))
///     .child(elem("item").attr("id", "2"))
///     .build();
///
/// let items = SimpleTree::query([root]).children_matching("item");
/// assert_eq!(items.to_string(), "$([item], [item])");
/// assert_eq!(items.last().to_vec().unwrap()[0].attribute("id"), Some("2"));
/// ```
pub struct Query<T: QueryItem> {
    stages: Vec<SharedStage<T>>,
    initial: Arc<[T]>,
    config: QueryConfig<T>,
    provider: Arc<dyn TreeProvider<T>>,
}

impl<T: QueryItem> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            stages: self.stages.clone(),
            initial: Arc::clone(&self.initial),
            config: self.config.clone(),
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<T: QueryItem> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("initial", &self.initial)
            .field("stages", &self.stage_names())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn slice_start(index: isize) -> Result<usize, QueryError> {
    usize::try_from(index).map_err(|_| {
        tracing::debug!(index, "rejected negative slice start");
        QueryError::NegativeIndex(index)
    })
}

impl<T: QueryItem> Query<T> {
    /// Query over `items` with the default configuration (depth-first, no selector compiler).
    pub fn new(provider: Arc<dyn TreeProvider<T>>, items: impl IntoIterator<Item = T>) -> Self {
        Self::with_config(provider, items, QueryConfig::default())
    }

    pub fn with_config(
        provider: Arc<dyn TreeProvider<T>>,
        items: impl IntoIterator<Item = T>,
        config: QueryConfig<T>,
    ) -> Self {
        Self { stages: Vec::new(), initial: items.into_iter().collect(), config, provider }
    }

    pub fn strategy(&self) -> SearchStrategy {
        self.config.strategy
    }

    pub fn config(&self) -> &QueryConfig<T> {
        &self.config
    }

    /// Names of the appended stages, in pipeline order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    fn bind(&self, matcher: impl Into<Matcher<T>>) -> BoundMatcher<T> {
        matcher.into().bind(self.config.selectors.as_ref())
    }

    fn expand(&self, axis: Axis<T>) -> SharedStage<T> {
        Arc::new(ExpandStage::new(axis, Arc::clone(&self.provider)))
    }

    fn keep(&self, matcher: impl Into<Matcher<T>>) -> SharedStage<T> {
        Arc::new(FilterStage::new(self.bind(matcher), true))
    }

    fn with_stage(&self, stage: SharedStage<T>) -> Self {
        let mut next = self.clone();
        next.stages.push(stage);
        next
    }

    fn with_stages(&self, first: SharedStage<T>, second: SharedStage<T>) -> Self {
        let mut next = self.clone();
        next.stages.extend([first, second]);
        next
    }

    fn expand_matching(&self, axis: Axis<T>, matcher: impl Into<Matcher<T>>) -> Self {
        self.with_stages(self.expand(axis), self.keep(matcher))
    }

    /// Same query, with a different traversal strategy for later `find`/`has` calls.
    #[must_use]
    pub fn search_strategy(&self, strategy: SearchStrategy) -> Self {
        let mut next = self.clone();
        next.config.strategy = strategy;
        next
    }

    /// Append extra elements after the current result.
    #[must_use]
    pub fn add(&self, items: impl IntoIterator<Item = T>) -> Self {
        self.with_stage(Arc::new(AddStage::new(items.into_iter().collect())))
    }

    #[must_use]
    pub fn filter(&self, matcher: impl Into<Matcher<T>>) -> Self {
        self.with_stage(self.keep(matcher))
    }

    /// Keep the elements the matcher rejects.
    #[must_use]
    pub fn not(&self, matcher: impl Into<Matcher<T>>) -> Self {
        self.with_stage(Arc::new(FilterStage::new(self.bind(matcher), false)))
    }

    /// Elements at result positions `from..=to`.
    ///
    /// # Errors
    ///
    /// [`QueryError::NegativeIndex`] if `from < 0`, [`QueryError::InvertedRange`] if `from > to`.
    pub fn slice(&self, from: isize, to: isize) -> Result<Self, QueryError> {
        let start = slice_start(from)?;
        if from > to {
            tracing::debug!(from, to, "rejected inverted slice range");
            return Err(QueryError::InvertedRange { from, to });
        }
        let end = slice_start(to)?;
        Ok(self.with_stage(Arc::new(SliceStage::new(start, Some(end)))))
    }

    /// Elements from result position `from` on.
    ///
    /// # Errors
    ///
    /// [`QueryError::NegativeIndex`] if `from < 0`.
    pub fn slice_from(&self, from: isize) -> Result<Self, QueryError> {
        let start = slice_start(from)?;
        Ok(self.with_stage(Arc::new(SliceStage::new(start, None))))
    }

    /// The element at result position `index`.
    ///
    /// # Errors
    ///
    /// [`QueryError::NegativeIndex`] if `index < 0`.
    #[allow(clippy::should_implement_trait)]
    pub fn eq(&self, index: isize) -> Result<Self, QueryError> {
        self.slice(index, index)
    }

    #[must_use]
    pub fn first(&self) -> Self {
        self.with_stage(Arc::new(SliceStage::new(0, Some(0))))
    }

    /// The final element. Evaluating this always drains everything before it.
    #[must_use]
    pub fn last(&self) -> Self {
        self.with_stage(Arc::new(LastStage))
    }

    #[must_use]
    pub fn unique(&self) -> Self {
        self.with_stage(Arc::new(UniqueStage))
    }

    #[must_use]
    pub fn children(&self) -> Self {
        self.with_stage(self.expand(Axis::Children))
    }

    #[must_use]
    pub fn children_matching(&self, matcher: impl Into<Matcher<T>>) -> Self {
        self.expand_matching(Axis::Children, matcher)
    }

    #[must_use]
    pub fn parent(&self) -> Self {
        self.with_stage(self.expand(Axis::Parent))
    }

    /// All ancestors, nearest first.
    #[must_use]
    pub fn parents(&self) -> Self {
        self.with_stage(self.expand(Axis::Parents(Reach::All)))
    }

    #[must_use]
    pub fn parents_matching(&self, matcher: impl Into<Matcher<T>>) -> Self {
        self.expand_matching(Axis::Parents(Reach::All), matcher)
    }

    /// Ancestors up to, but not including, the first one the matcher accepts.
    #[must_use]
    pub fn parents_until(&self, matcher: impl Into<Matcher<T>>) -> Self {
        self.with_stage(self.expand(Axis::Parents(Reach::Until(self.bind(matcher)))))
    }

    /// All children of each element's parent, the element itself included.
    #[must_use]
    pub fn siblings(&self) -> Self {
        self.with_stage(self.expand(Axis::Siblings))
    }

    #[must_use]
    pub fn siblings_matching(&self, matcher: impl Into<Matcher<T>>) -> Self {
        self.expand_matching(Axis::Siblings, matcher)
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&self) -> Self {
        self.with_stage(self.expand(Axis::Next(Reach::One)))
    }

    #[must_use]
    pub fn next_matching(&self, matcher: impl Into<Matcher<T>>) -> Self {
        self.expand_matching(Axis::Next(Reach::One), matcher)
    }

    #[must_use]
    pub fn next_all(&self) -> Self {
        self.with_stage(self.expand(Axis::Next(Reach::All)))
    }

    #[must_use]
    pub fn next_all_matching(&self, matcher: impl Into<Matcher<T>>) -> Self {
        self.expand_matching(Axis::Next(Reach::All), matcher)
    }

    #[must_use]
    pub fn next_until(&self, matcher: impl Into<Matcher<T>>) -> Self {
        self.with_stage(self.expand(Axis::Next(Reach::Until(self.bind(matcher)))))
    }

    #[must_use]
    pub fn prev(&self) -> Self {
        self.with_stage(self.expand(Axis::Prev(Reach::One)))
    }

    #[must_use]
    pub fn prev_matching(&self, matcher: impl Into<Matcher<T>>) -> Self {
        self.expand_matching(Axis::Prev(Reach::One), matcher)
    }

    /// All preceding siblings, nearest first.
    #[must_use]
    pub fn prev_all(&self) -> Self {
        self.with_stage(self.expand(Axis::Prev(Reach::All)))
    }

    #[must_use]
    pub fn prev_all_matching(&self, matcher: impl Into<Matcher<T>>) -> Self {
        self.expand_matching(Axis::Prev(Reach::All), matcher)
    }

    #[must_use]
    pub fn prev_until(&self, matcher: impl Into<Matcher<T>>) -> Self {
        self.with_stage(self.expand(Axis::Prev(Reach::Until(self.bind(matcher)))))
    }

    /// All descendants, in the order of the current search strategy.
    #[must_use]
    pub fn find(&self) -> Self {
        self.with_stage(self.expand(Axis::Descendants(self.config.strategy)))
    }

    /// Matching descendants. A member list is resolved by testing each listed element for
    /// ancestry instead of walking the subtree, and keeps the list order.
    #[must_use]
    pub fn find_matching(&self, matcher: impl Into<Matcher<T>>) -> Self {
        let matcher = self.bind(matcher);
        if let Some(members) = matcher.members() {
            return self.with_stage(self.expand(Axis::DescendantsAmong(Arc::clone(members))));
        }
        self.with_stages(
            self.expand(Axis::Descendants(self.config.strategy)),
            Arc::new(FilterStage::new(matcher, true)),
        )
    }

    /// Elements with at least one descendant the matcher accepts.
    #[must_use]
    pub fn has(&self, matcher: impl Into<Matcher<T>>) -> Self {
        let matcher = self.bind(matcher);
        let nested: Vec<SharedStage<T>> = match matcher.members() {
            Some(members) => vec![self.expand(Axis::DescendantsAmong(Arc::clone(members)))],
            None => vec![
                self.expand(Axis::Descendants(self.config.strategy)),
                Arc::new(FilterStage::new(matcher, true)),
            ],
        };
        self.with_stage(Arc::new(SupportStage::new(Composite::new(nested), Correlation::Support)))
    }

    /// For each element, the first of itself and its ancestors the matcher accepts.
    #[must_use]
    pub fn closest(&self, matcher: impl Into<Matcher<T>>) -> Self {
        let nested: Vec<SharedStage<T>> = vec![self.expand(Axis::AncestorsOrSelf), self.keep(matcher)];
        self.with_stage(Arc::new(SupportStage::new(Composite::new(nested), Correlation::FirstMatch)))
    }

    /// Lazy, single-pass iterator over the result.
    ///
    /// Host failures surface as `Err` items when the affected element is pulled; the iterator
    /// ends after the first error.
    pub fn iter(&self) -> QueryIter<T> {
        tracing::trace!(stages = self.stages.len(), initial = self.initial.len(), "assembling query pipeline");
        let pipeline = Composite::new(self.stages.clone());
        let source: BoxedCursor<T> = Box::new(Decorate::new(Arc::clone(&self.initial)));
        let filtered: BoxedCursor<T> = Box::new(DropEmpty::new(pipeline.apply(source)));
        QueryIter { inner: Strip::new(filtered), failed: false }
    }

    /// Materialize the whole result.
    ///
    /// # Errors
    ///
    /// The first error raised while evaluating.
    pub fn to_vec(&self) -> Result<Vec<T>, QueryError> {
        self.iter().collect()
    }
}

impl<T: QueryItem + fmt::Display> Query<T> {
    /// Debug rendering of the result: `$([a], [b], [c])`.
    ///
    /// # Errors
    ///
    /// The first error raised while evaluating.
    pub fn render(&self) -> Result<String, QueryError> {
        let items = itertools::process_results(self.iter(), |items| items.map(|item| format!("[{item}]")).join(", "))?;
        Ok(format!("$({items})"))
    }
}

impl<T: QueryItem + fmt::Display> fmt::Display for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Ok(s) => f.write_str(&s),
            Err(e) => write!(f, "$(<{e}>)"),
        }
    }
}

impl<'a, T: QueryItem> IntoIterator for &'a Query<T> {
    type Item = Result<T, QueryError>;
    type IntoIter = QueryIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Terminal iterator returned by [`Query::iter`].
pub struct QueryIter<T> {
    inner: Strip<T>,
    failed: bool,
}

impl<T> Iterator for QueryIter<T> {
    type Item = Result<T, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.inner.next()?;
        self.failed = item.is_err();
        Some(item)
    }
}

impl<T> core::iter::FusedIterator for QueryIter<T> {}
