//! Simple in-memory element tree used in tests, benches and quick prototypes.
//!
//! Nodes are immutable once built, compared by identity and cheap to clone. [`SimpleTree`]
//! exposes them to queries and binds [`SimpleSelectors`] as the selector syntax.
//!
//! ```
//! use platynui_query::simple::{SimpleTree, elem};
//!
//! // <form><input name="user"/><input name="pass" type="password"/><button/></form>
//! let form = elem("form")
//!     .child(elem("input").attr("name", "user"))
//!     .child(elem("input").attr("name", "pass").attr("type", "password"))
//!     .child(elem("button"))
//!     .build();
//!
//! let q = SimpleTree::query([form]).find_matching("input[type=password]");
//! let hits = q.to_vec().unwrap();
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].path(), "/form/input");
//! ```
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use crate::error::QueryError;
use crate::model::TreeProvider;
use crate::query::{Query, QueryConfig};

mod selector;

pub use selector::SimpleSelectors;

struct Inner {
    name: String,
    attributes: Vec<(String, String)>,
    // set once, when the parent is built
    parent: OnceLock<Weak<Inner>>,
    children: Vec<SimpleNode>,
}

/// Arc-backed element node with identity equality.
#[derive(Clone)]
pub struct SimpleNode(Arc<Inner>);

impl PartialEq for SimpleNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for SimpleNode {}
impl std::hash::Hash for SimpleNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for SimpleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleNode")
            .field("name", &self.0.name)
            .field("attributes", &self.0.attributes)
            .field("children", &self.0.children.len())
            .finish()
    }
}

impl fmt::Display for SimpleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

impl SimpleNode {
    pub fn element(name: &str) -> SimpleNodeBuilder {
        SimpleNodeBuilder { name: name.to_owned(), attributes: Vec::new(), children: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.0.attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.0.attributes
    }

    pub fn children(&self) -> &[SimpleNode] {
        &self.0.children
    }

    /// `None` for roots, and for nodes whose parent has already been dropped.
    pub fn parent(&self) -> Option<SimpleNode> {
        self.0.parent.get().and_then(Weak::upgrade).map(SimpleNode)
    }

    /// Slash separated names from the root down to this node, e.g. `/form/input`.
    pub fn path(&self) -> String {
        let mut names = vec![self.name().to_owned()];
        let mut cur = self.parent();
        while let Some(p) = cur {
            names.push(p.name().to_owned());
            cur = p.parent();
        }
        names.reverse();
        format!("/{}", names.join("/"))
    }
}

pub struct SimpleNodeBuilder {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<SimpleNode>,
}

impl SimpleNodeBuilder {
    #[must_use]
    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.attributes.push((key.to_owned(), value.to_owned()));
        self
    }

    #[must_use]
    pub fn child(mut self, child: impl Into<SimpleNode>) -> Self {
        self.children.push(child.into());
        self
    }

    #[must_use]
    pub fn children<I: IntoIterator<Item = SimpleNodeBuilder>>(mut self, it: I) -> Self {
        self.children.extend(it.into_iter().map(SimpleNodeBuilder::build));
        self
    }

    /// Finalize the node and link its children back to it. A node that is already attached
    /// keeps its first parent.
    pub fn build(self) -> SimpleNode {
        let node = SimpleNode(Arc::new(Inner {
            name: self.name,
            attributes: self.attributes,
            parent: OnceLock::new(),
            children: self.children,
        }));
        for c in &node.0.children {
            let _ = c.0.parent.set(Arc::downgrade(&node.0));
        }
        node
    }
}

impl From<SimpleNodeBuilder> for SimpleNode {
    fn from(b: SimpleNodeBuilder) -> Self {
        b.build()
    }
}

pub fn elem(name: &str) -> SimpleNodeBuilder {
    SimpleNode::element(name)
}

/// [`TreeProvider`] over [`SimpleNode`] trees.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleTree;

impl TreeProvider<SimpleNode> for SimpleTree {
    fn children(&self, node: &SimpleNode) -> Result<Vec<SimpleNode>, QueryError> {
        Ok(node.children().to_vec())
    }

    fn parent(&self, node: &SimpleNode) -> Result<Option<SimpleNode>, QueryError> {
        Ok(node.parent())
    }
}

impl SimpleTree {
    /// Query over `nodes` with [`SimpleSelectors`] bound.
    pub fn query(nodes: impl IntoIterator<Item = SimpleNode>) -> Query<SimpleNode> {
        Query::with_config(Arc::new(SimpleTree), nodes, Self::config())
    }

    pub fn config() -> QueryConfig<SimpleNode> {
        QueryConfig::new().with_selector_compiler(Arc::new(SimpleSelectors))
    }
}
