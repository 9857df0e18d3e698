use core::fmt;
use core::hash::Hash;
use core::str::FromStr;
use std::sync::Arc;

use crate::error::QueryError;

/// Bound shared by every element type a query can run over.
///
/// Equality identifies "the same element" (used by `unique`, member matchers and the
/// descendant test); it should be cheap, e.g. pointer identity.
pub trait QueryItem: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

impl<T> QueryItem for T where T: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

/// Compiled element test. Fallible so host predicates can surface their own failures lazily.
pub type Predicate<T> = Arc<dyn Fn(&T) -> Result<bool, QueryError> + Send + Sync>;

/// Wrap a closure as a [`Predicate`].
pub fn predicate<T, F>(f: F) -> Predicate<T>
where
    F: Fn(&T) -> Result<bool, QueryError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Host node capability.
///
/// Sequences must come back in a deterministic order that stays stable for the duration of
/// one evaluation; slicing and indexing depend on it.
pub trait TreeProvider<T: QueryItem>: Send + Sync {
    fn children(&self, node: &T) -> Result<Vec<T>, QueryError>;

    fn parent(&self, node: &T) -> Result<Option<T>, QueryError>;

    /// All children of the parent, including `node` itself. A root is its own only sibling.
    fn siblings(&self, node: &T) -> Result<Vec<T>, QueryError> {
        match self.parent(node)? {
            Some(parent) => self.children(&parent),
            None => Ok(vec![node.clone()]),
        }
    }

    /// True if `node` is a strict descendant of `root`.
    fn is_descendant(&self, root: &T, node: &T) -> Result<bool, QueryError> {
        let mut cur = self.parent(node)?;
        let mut guard = 0usize;
        while let Some(p) = cur {
            if &p == root {
                return Ok(true);
            }
            let next = self.parent(&p)?;
            // Cycle guards: parent() returns self or path too deep
            if next.as_ref().is_some_and(|q| q == &p) {
                break;
            }
            cur = next;
            guard = guard.saturating_add(1);
            if guard > 1_000_000 {
                break;
            }
        }
        Ok(false)
    }
}

/// Turns selector strings into element tests. The syntax is entirely up to the host.
pub trait SelectorCompiler<T: QueryItem>: Send + Sync {
    fn compile(&self, selector: &str) -> Result<Predicate<T>, QueryError>;
}

/// Expansion order used when walking descendants (`find`, `has`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SearchStrategy {
    #[default]
    DepthFirst,
    BreadthFirst,
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStrategy::DepthFirst => f.write_str("depth-first"),
            SearchStrategy::BreadthFirst => f.write_str("breadth-first"),
        }
    }
}

impl FromStr for SearchStrategy {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dfs" | "depth-first" | "depthfirst" => Ok(SearchStrategy::DepthFirst),
            "bfs" | "breadth-first" | "breadthfirst" => Ok(SearchStrategy::BreadthFirst),
            _ => Err(QueryError::UnknownStrategy(s.to_string())),
        }
    }
}
