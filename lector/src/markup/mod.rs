//! Minimal XML tree: parse, inspect, edit and serialize documents.

mod entities;
mod node;
mod normalize;
mod parser;
mod writer;

use std::fmt;

pub use node::{Fragment, Node};
pub use normalize::normalize;
pub use parser::{parse_document, parse_fragment};
pub use writer::{write_document, write_fragments, XML_DECLARATION};

/// Why a piece of markup could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub message: String,
    /// Byte offset into the parsed input
    pub position: usize,
}

impl ParseFailure {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.message, self.position)
    }
}

impl std::error::Error for ParseFailure {}

#[cfg(test)]
pub(crate) mod strategies {
    use proptest::prelude::*;

    use super::Node;

    fn text() -> impl Strategy<Value = String> {
        proptest::string::string_regex("[a-zA-Z0-9äöü.,;!?&<>\"' \n]{0,24}").unwrap()
    }

    fn leaf() -> impl Strategy<Value = Node> {
        (
            prop::sample::select(vec!["b", "i", "em", "span", "note"]),
            prop::option::of(("[a-z]{1,6}", text())),
            text(),
            text(),
        )
            .prop_map(|(tag, attribute, text, tail)| {
                let mut node = Node::new(tag).with_text(text).with_tail(tail);
                if let Some((name, value)) = attribute {
                    node.set_attribute(name, value);
                }
                node
            })
    }

    /// Arbitrary element trees with mixed content and tails.
    pub fn tree() -> impl Strategy<Value = Node> {
        leaf().prop_recursive(4, 32, 5, |inner| {
            (leaf(), prop::collection::vec(inner, 0..5)).prop_map(|(mut node, children)| {
                node.children = children;
                node
            })
        })
    }

    /// A `body` root around an arbitrary tree, without tail.
    pub fn document() -> impl Strategy<Value = Node> {
        (text(), prop::collection::vec(tree(), 0..6)).prop_map(|(text, children)| {
            let mut root = Node::new("body").with_text(text);
            root.children = children;
            root
        })
    }
}
