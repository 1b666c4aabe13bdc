//! Markup serialization.

use super::entities::{escape_attribute, escape_text};
use super::{Fragment, Node};

pub const XML_DECLARATION: &str = "<?xml version='1.0' encoding='utf-8'?>";

/// Append the element (without its tail) to `out`.
pub fn write_node(out: &mut String, node: &Node) {
    out.push('<');
    out.push_str(&node.tag);
    for (name, value) in &node.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attribute(value, out);
        out.push('"');
    }

    if node.has_no_content() {
        out.push_str(" />");
        return;
    }

    out.push('>');
    escape_text(&node.text, out);
    for child in &node.children {
        write_node(out, child);
        escape_text(&child.tail, out);
    }
    out.push_str("</");
    out.push_str(&node.tag);
    out.push('>');
}

/// Serialize a fragment sequence as it would appear inside an element.
pub fn write_fragments(fragments: &[Fragment]) -> String {
    let mut out = String::new();
    for fragment in fragments {
        match fragment {
            Fragment::Text(text) => escape_text(text, &mut out),
            Fragment::Node(node) => write_node(&mut out, node),
        }
    }
    out
}

/// Serialize a whole document with an XML declaration.
pub fn write_document(root: &Node) -> String {
    let mut out = String::with_capacity(XML_DECLARATION.len() + 1024);
    out.push_str(XML_DECLARATION);
    out.push('\n');
    write_node(&mut out, root);
    escape_text(&root.tail, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_empty_element() {
        let node = Node::new("br").with_attribute("class", "x");
        assert_eq!(node.to_markup(), "<br class=\"x\" />");
    }

    #[test]
    fn test_write_mixed_content() {
        let node = Node::new("p")
            .with_text("A & B ")
            .with_child(Node::new("b").with_text("bold").with_tail(" < end"));
        assert_eq!(node.to_markup(), "<p>A &amp; B <b>bold</b> &lt; end</p>");
    }

    #[test]
    fn test_write_fragments() {
        let fragments = vec![
            Fragment::Text("one ".into()),
            Fragment::Node(Node::new("i").with_text("two")),
            Fragment::Text(" three".into()),
        ];
        assert_eq!(write_fragments(&fragments), "one <i>two</i> three");
    }

    #[test]
    fn test_write_document_has_declaration() {
        let doc = write_document(&Node::new("root").with_text("x"));
        assert_eq!(doc, "<?xml version='1.0' encoding='utf-8'?>\n<root>x</root>");
    }
}
