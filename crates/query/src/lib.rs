//! Lazy, chainable queries over any tree a [`TreeProvider`] can describe.
//!
//! A [`Query`] is an immutable list of stages over an initial element list. Stages exchange
//! [`TaggedOption`] streams so that every produced element can be traced back to the input
//! element it came from; that is what lets `has` and `closest` correlate a nested pipeline with
//! the outer one in a single forward pass.

pub mod adapters;
pub mod cursor;
pub mod error;
pub mod matcher;
pub mod model;
pub mod option;
pub mod query;
pub mod simple;
pub mod stage;

pub use error::QueryError;
pub use matcher::Matcher;
pub use model::{Predicate, QueryItem, SearchStrategy, SelectorCompiler, TreeProvider, predicate};
pub use option::TaggedOption;
pub use query::{Query, QueryConfig, QueryIter};
pub use simple::{SimpleNode, SimpleNodeBuilder, SimpleSelectors, SimpleTree, elem};
