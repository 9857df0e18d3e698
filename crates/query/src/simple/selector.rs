use pest::Parser;
use pest::iterators::Pair;

use crate::error::QueryError;
use crate::model::{Predicate, SelectorCompiler, predicate};

use super::SimpleNode;

#[derive(pest_derive::Parser)]
#[grammar = "simple/selector.pest"]
struct SelectorGrammar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Equals,
    NotEquals,
    Prefix,
    Suffix,
    Contains,
}

#[derive(Debug, Clone)]
struct AttrTest {
    key: String,
    op: Option<(AttrOp, String)>,
}

impl AttrTest {
    fn matches(&self, node: &SimpleNode) -> bool {
        let actual = node.attribute(&self.key);
        match (&self.op, actual) {
            (None, found) => found.is_some(),
            // absent attributes differ from every value
            (Some((AttrOp::NotEquals, _)), None) => true,
            (Some(_), None) => false,
            (Some((op, expected)), Some(actual)) => match op {
                AttrOp::Equals => actual == expected,
                AttrOp::NotEquals => actual != expected,
                AttrOp::Prefix => actual.starts_with(expected.as_str()),
                AttrOp::Suffix => actual.ends_with(expected.as_str()),
                AttrOp::Contains => actual.contains(expected.as_str()),
            },
        }
    }
}

/// One comma separated alternative: `name[attr]...`.
#[derive(Debug, Clone, Default)]
struct Compound {
    name: Option<String>,
    attributes: Vec<AttrTest>,
}

impl Compound {
    fn matches(&self, node: &SimpleNode) -> bool {
        self.name.as_deref().is_none_or(|n| n == node.name()) && self.attributes.iter().all(|a| a.matches(node))
    }
}

fn parse(selector: &str) -> Result<Vec<Compound>, QueryError> {
    let pairs =
        SelectorGrammar::parse(Rule::selector_list, selector).map_err(|e| QueryError::selector(selector, e.to_string()))?;
    Ok(pairs.flatten().filter(|p| p.as_rule() == Rule::compound).map(build_compound).collect())
}

fn build_compound(pair: Pair<'_, Rule>) -> Compound {
    let mut compound = Compound::default();
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::name => compound.name = Some(part.as_str().to_owned()),
            Rule::attribute => compound.attributes.push(build_attribute(part)),
            _ => {}
        }
    }
    compound
}

fn build_attribute(pair: Pair<'_, Rule>) -> AttrTest {
    let mut key = String::new();
    let mut op = None;
    let mut value = String::new();
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::key => key = part.as_str().to_owned(),
            Rule::op => {
                op = Some(match part.as_str() {
                    "!=" => AttrOp::NotEquals,
                    "^=" => AttrOp::Prefix,
                    "$=" => AttrOp::Suffix,
                    "*=" => AttrOp::Contains,
                    _ => AttrOp::Equals,
                });
            }
            Rule::quoted => {
                let s = part.as_str();
                value = s[1..s.len() - 1].to_owned();
            }
            Rule::bare => value = part.as_str().to_owned(),
            _ => {}
        }
    }
    AttrTest { key, op: op.map(|op| (op, value)) }
}

/// Selector syntax for [`SimpleNode`] trees.
///
/// A selector is a comma separated list of alternatives; each is an element name or `*`,
/// followed by any number of attribute tests: `[k]`, `[k=v]`, `[k!=v]`, `[k^=v]`, `[k$=v]`,
/// `[k*=v]`. Values may be bare or quoted with `"` or `'`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleSelectors;

impl SelectorCompiler<SimpleNode> for SimpleSelectors {
    fn compile(&self, selector: &str) -> Result<Predicate<SimpleNode>, QueryError> {
        let alternatives = parse(selector)?;
        tracing::trace!(selector, alternatives = alternatives.len(), "compiled simple selector");
        Ok(predicate(move |node: &SimpleNode| Ok(alternatives.iter().any(|c| c.matches(node)))))
    }
}
