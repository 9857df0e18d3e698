//! Element tests accepted by filtering operations.

use core::fmt;
use std::sync::Arc;

use crate::error::QueryError;
use crate::model::{Predicate, QueryItem, SelectorCompiler, predicate};

/// What a filtering operation should keep.
pub enum Matcher<T> {
    /// Matches every element.
    Any,
    Predicate(Predicate<T>),
    /// Host selector syntax, compiled the first time a stage using it is pulled.
    Selector(String),
    /// Membership by element equality.
    Members(Arc<[T]>),
}

impl<T: QueryItem> Matcher<T> {
    pub fn any() -> Self {
        Matcher::Any
    }

    pub fn from_fn(f: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Matcher::Predicate(predicate(move |item| Ok(f(item))))
    }

    pub fn try_from_fn(f: impl Fn(&T) -> Result<bool, QueryError> + Send + Sync + 'static) -> Self {
        Matcher::Predicate(predicate(f))
    }

    /// Blank selectors match everything.
    pub fn selector(selector: impl Into<String>) -> Self {
        let selector = selector.into();
        if selector.trim().is_empty() { Matcher::Any } else { Matcher::Selector(selector) }
    }

    pub fn members(items: impl IntoIterator<Item = T>) -> Self {
        Matcher::Members(items.into_iter().collect())
    }

    pub(crate) fn bind(self, compiler: Option<&Arc<dyn SelectorCompiler<T>>>) -> BoundMatcher<T> {
        let kind = match self {
            Matcher::Any => Bound::Any,
            Matcher::Predicate(p) => Bound::Predicate(p),
            Matcher::Selector(source) => Bound::Selector { source: source.into(), compiler: compiler.cloned() },
            Matcher::Members(items) => Bound::Members(items),
        };
        BoundMatcher { kind }
    }
}

impl<T> Clone for Matcher<T> {
    fn clone(&self) -> Self {
        match self {
            Matcher::Any => Matcher::Any,
            Matcher::Predicate(p) => Matcher::Predicate(Arc::clone(p)),
            Matcher::Selector(s) => Matcher::Selector(s.clone()),
            Matcher::Members(m) => Matcher::Members(Arc::clone(m)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Matcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Any => f.write_str("Any"),
            Matcher::Predicate(_) => f.write_str("Predicate(..)"),
            Matcher::Selector(s) => f.debug_tuple("Selector").field(s).finish(),
            Matcher::Members(m) => f.debug_tuple("Members").field(m).finish(),
        }
    }
}

impl<T: QueryItem> From<&str> for Matcher<T> {
    fn from(selector: &str) -> Self {
        Matcher::selector(selector)
    }
}

impl<T: QueryItem> From<String> for Matcher<T> {
    fn from(selector: String) -> Self {
        Matcher::selector(selector)
    }
}

impl<T: QueryItem> From<Vec<T>> for Matcher<T> {
    fn from(items: Vec<T>) -> Self {
        Matcher::Members(items.into())
    }
}

enum Bound<T: QueryItem> {
    Any,
    Predicate(Predicate<T>),
    Selector { source: Arc<str>, compiler: Option<Arc<dyn SelectorCompiler<T>>> },
    Members(Arc<[T]>),
}

/// A matcher paired with the selector compiler of the query that created it.
pub(crate) struct BoundMatcher<T: QueryItem> {
    kind: Bound<T>,
}

impl<T: QueryItem> Clone for BoundMatcher<T> {
    fn clone(&self) -> Self {
        let kind = match &self.kind {
            Bound::Any => Bound::Any,
            Bound::Predicate(p) => Bound::Predicate(Arc::clone(p)),
            Bound::Selector { source, compiler } => {
                Bound::Selector { source: Arc::clone(source), compiler: compiler.clone() }
            }
            Bound::Members(m) => Bound::Members(Arc::clone(m)),
        };
        Self { kind }
    }
}

impl<T: QueryItem> BoundMatcher<T> {
    /// Member list, if this matcher is a plain membership test.
    pub(crate) fn members(&self) -> Option<&Arc<[T]>> {
        match &self.kind {
            Bound::Members(m) => Some(m),
            _ => None,
        }
    }

    fn compile(&self) -> Result<Predicate<T>, QueryError> {
        match &self.kind {
            Bound::Any => Ok(predicate(|_| Ok(true))),
            Bound::Predicate(p) => Ok(Arc::clone(p)),
            Bound::Selector { source, compiler } => match compiler {
                Some(c) => c.compile(source),
                None => Err(QueryError::NoSelectorCompiler(source.to_string())),
            },
            Bound::Members(m) => {
                let members = Arc::clone(m);
                Ok(predicate(move |item| Ok(members.contains(item))))
            }
        }
    }

    /// Fresh per-cursor test that compiles on first use.
    pub(crate) fn lazy(&self) -> LazyPredicate<T> {
        LazyPredicate { matcher: self.clone(), compiled: None }
    }
}

/// Compiles its matcher on the first test and caches the result for the cursor's lifetime.
pub(crate) struct LazyPredicate<T: QueryItem> {
    matcher: BoundMatcher<T>,
    compiled: Option<Predicate<T>>,
}

impl<T: QueryItem> LazyPredicate<T> {
    pub(crate) fn test(&mut self, item: &T) -> Result<bool, QueryError> {
        if let Some(p) = &self.compiled {
            return p(item);
        }
        let p = self.matcher.compile()?;
        let verdict = p(item);
        self.compiled = Some(p);
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct Prefix;

    impl SelectorCompiler<String> for Prefix {
        fn compile(&self, selector: &str) -> Result<Predicate<String>, QueryError> {
            if selector.contains(' ') {
                return Err(QueryError::selector(selector, "spaces are not allowed"));
            }
            let prefix = selector.to_string();
            Ok(predicate(move |item: &String| Ok(item.starts_with(&prefix))))
        }
    }

    #[rstest]
    fn blank_selector_is_any() {
        assert!(matches!(Matcher::<String>::selector("  "), Matcher::Any));
    }

    #[rstest]
    fn members_match_by_equality() {
        let mut p = Matcher::members(vec![1, 3]).bind(None).lazy();
        assert!(p.test(&1).unwrap());
        assert!(!p.test(&2).unwrap());
    }

    #[rstest]
    fn selector_uses_bound_compiler() {
        let compiler: Arc<dyn SelectorCompiler<String>> = Arc::new(Prefix);
        let mut p = Matcher::<String>::from("ab").bind(Some(&compiler)).lazy();
        assert!(p.test(&"abc".to_string()).unwrap());
        assert!(!p.test(&"bca".to_string()).unwrap());
    }

    #[rstest]
    fn selector_failures_surface_on_test() {
        let compiler: Arc<dyn SelectorCompiler<String>> = Arc::new(Prefix);
        let mut bad = Matcher::<String>::from("a b").bind(Some(&compiler)).lazy();
        assert!(matches!(bad.test(&"a".to_string()), Err(QueryError::Selector { .. })));
        let mut missing = Matcher::<String>::from("a").bind(None).lazy();
        assert!(matches!(missing.test(&"a".to_string()), Err(QueryError::NoSelectorCompiler(_))));
    }
}
