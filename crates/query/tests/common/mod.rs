#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use platynui_query::simple::{SimpleNode, SimpleTree, elem};
use platynui_query::{Query, QueryError, TreeProvider};

// root
// ├─ header[id=h]
// │   ├─ title
// │   └─ nav
// │       ├─ link[href=a]
// │       └─ link[href=b]
// ├─ main
// │   ├─ section[id=s1]
// │   │   ├─ p
// │   │   └─ p[class=note]
// │   └─ section[id=s2]
// │       └─ list
// │           ├─ item[n=1]
// │           ├─ item[n=2]
// │           └─ item[n=3]
// └─ footer
pub fn page() -> SimpleNode {
    elem("root")
        .child(
            elem("header")
                .attr("id", "h")
                .child(elem("title"))
                .child(elem("nav").child(elem("link").attr("href", "a")).child(elem("link").attr("href", "b"))),
        )
        .child(
            elem("main")
                .child(elem("section").attr("id", "s1").child(elem("p")).child(elem("p").attr("class", "note")))
                .child(
                    elem("section").attr("id", "s2").child(elem("list").children([
                        elem("item").attr("n", "1"),
                        elem("item").attr("n", "2"),
                        elem("item").attr("n", "3"),
                    ])),
                ),
        )
        .child(elem("footer"))
        .build()
}

/// First descendant of `root` matching `selector`.
pub fn pick(root: &SimpleNode, selector: &str) -> SimpleNode {
    SimpleTree::query([root.clone()]).find_matching(selector).first().to_vec().unwrap().pop().expect("no node matches")
}

pub fn names(q: &Query<SimpleNode>) -> Vec<String> {
    q.to_vec().unwrap().iter().map(|n| n.name().to_owned()).collect()
}

pub fn attrs(q: &Query<SimpleNode>, key: &str) -> Vec<String> {
    q.to_vec().unwrap().iter().map(|n| n.attribute(key).unwrap_or("-").to_owned()).collect()
}

/// Counts provider calls on top of [`SimpleTree`].
#[derive(Default)]
pub struct CountingTree {
    pub children_calls: AtomicUsize,
    pub parent_calls: AtomicUsize,
}

impl CountingTree {
    pub fn children_calls(&self) -> usize {
        self.children_calls.load(Ordering::SeqCst)
    }

    pub fn parent_calls(&self) -> usize {
        self.parent_calls.load(Ordering::SeqCst)
    }
}

impl TreeProvider<SimpleNode> for CountingTree {
    fn children(&self, node: &SimpleNode) -> Result<Vec<SimpleNode>, QueryError> {
        self.children_calls.fetch_add(1, Ordering::SeqCst);
        SimpleTree.children(node)
    }

    fn parent(&self, node: &SimpleNode) -> Result<Option<SimpleNode>, QueryError> {
        self.parent_calls.fetch_add(1, Ordering::SeqCst);
        SimpleTree.parent(node)
    }
}

pub fn counting_query(tree: &Arc<CountingTree>, nodes: impl IntoIterator<Item = SimpleNode>) -> Query<SimpleNode> {
    let provider: Arc<dyn TreeProvider<SimpleNode>> = tree.clone();
    Query::with_config(provider, nodes, SimpleTree::config())
}

/// Fails whenever the children of a node with the given name are requested.
pub struct FailingTree(pub &'static str);

impl TreeProvider<SimpleNode> for FailingTree {
    fn children(&self, node: &SimpleNode) -> Result<Vec<SimpleNode>, QueryError> {
        if node.name() == self.0 {
            return Err(QueryError::provider(format!("cannot list children of {}", node.name())));
        }
        SimpleTree.children(node)
    }

    fn parent(&self, node: &SimpleNode) -> Result<Option<SimpleNode>, QueryError> {
        SimpleTree.parent(node)
    }
}
