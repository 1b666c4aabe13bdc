//! Collapse redundant nested wrappers such as `<p><p>x</p></p>`.

use super::Node;

/// Collapse, below `root`, every `tag` element that has no attributes, no
/// non-whitespace text and a single `tag` child, into that child. Repeats
/// until no such wrapper remains. The root itself is never collapsed.
pub fn normalize(mut root: Node, tag: &str) -> Node {
    root.children = std::mem::take(&mut root.children)
        .into_iter()
        .map(|child| collapse(child, tag))
        .collect();
    root
}

fn collapse(mut node: Node, tag: &str) -> Node {
    while is_redundant_wrapper(&node, tag) {
        let tail = std::mem::take(&mut node.tail);
        let Some(mut inner) = node.children.pop() else {
            break;
        };
        inner.tail = tail;
        node = inner;
    }
    normalize(node, tag)
}

fn is_redundant_wrapper(node: &Node, tag: &str) -> bool {
    node.tag == tag
        && node.attributes.is_empty()
        && node.text.trim().is_empty()
        && node.children.len() == 1
        && node.children[0].tag == tag
        && node.children[0].tail.trim().is_empty()
}
