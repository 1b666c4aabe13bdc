//! Element tree with ElementTree-style tail text.

use super::writer;

/// An element with its attributes, leading text, children and tail.
///
/// The text that follows a child up to the next sibling (or the parent's end
/// tag) is stored on the child as `tail`, so
/// `text, child₁, tail₁, child₂, tail₂, …` reproduces the element's content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    /// Element name, including any namespace prefix
    pub tag: String,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Text before the first child
    pub text: String,
    /// Child elements in document order
    pub children: Vec<Node>,
    /// Text after this element's end tag, owned by the parent's content
    pub tail: String,
}

/// One piece of an element's mixed content.
///
/// A `Node` fragment never carries a tail; the text that followed it is the
/// next `Text` fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    Node(Node),
}

impl Fragment {
    /// Whitespace-separated words in this fragment, including descendants.
    pub fn word_count(&self) -> usize {
        match self {
            Fragment::Text(text) => text.split_whitespace().count(),
            Fragment::Node(node) => node.word_count(),
        }
    }

    /// Concatenated character data of this fragment.
    pub fn text_content(&self) -> String {
        match self {
            Fragment::Text(text) => text.clone(),
            Fragment::Node(node) => node.text_content(),
        }
    }
}

impl Node {
    /// Create an empty element.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder-style text setter.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Builder-style tail setter.
    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = tail.into();
        self
    }

    /// Look up an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set or replace an attribute, keeping its position if it exists.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// True if the element has neither text nor children.
    pub fn has_no_content(&self) -> bool {
        self.text.is_empty() && self.children.is_empty()
    }

    /// All character data inside the element, without its own tail.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        out.push_str(&self.text);
        for child in &self.children {
            child.collect_text(out);
            out.push_str(&child.tail);
        }
    }

    /// Whitespace-split word count of [`Node::text_content`].
    pub fn word_count(&self) -> usize {
        self.text_content().split_whitespace().count()
    }

    /// The element's mixed content as fragments. Empty text runs are omitted.
    pub fn content(&self) -> Vec<Fragment> {
        let mut fragments = Vec::with_capacity(self.children.len() * 2 + 1);
        if !self.text.is_empty() {
            fragments.push(Fragment::Text(self.text.clone()));
        }
        for child in &self.children {
            let mut node = child.clone();
            let tail = std::mem::take(&mut node.tail);
            fragments.push(Fragment::Node(node));
            if !tail.is_empty() {
                fragments.push(Fragment::Text(tail));
            }
        }
        fragments
    }

    /// Replace the element's content. Inverse of [`Node::content`].
    pub fn set_content(&mut self, fragments: impl IntoIterator<Item = Fragment>) {
        self.text.clear();
        self.children.clear();
        for fragment in fragments {
            match fragment {
                Fragment::Text(text) => match self.children.last_mut() {
                    Some(last) => last.tail.push_str(&text),
                    None => self.text.push_str(&text),
                },
                Fragment::Node(mut node) => {
                    node.tail.clear();
                    self.children.push(node);
                }
            }
        }
    }

    /// Descendants with the given tag in document order (`.//tag`).
    pub fn find_all(&self, tag: &str) -> Vec<&Node> {
        let mut found = Vec::new();
        for child in &self.children {
            child.collect_matching(tag, &mut found);
        }
        found
    }

    fn collect_matching<'a>(&'a self, tag: &str, found: &mut Vec<&'a Node>) {
        if self.tag == tag {
            found.push(self);
        }
        for child in &self.children {
            child.collect_matching(tag, found);
        }
    }

    /// Child-index paths of descendants with the given tag, in document order.
    pub fn find_paths(&self, tag: &str) -> Vec<Vec<usize>> {
        let mut paths = Vec::new();
        let mut prefix = Vec::new();
        self.collect_paths(tag, &mut prefix, &mut paths);
        paths
    }

    fn collect_paths(&self, tag: &str, prefix: &mut Vec<usize>, paths: &mut Vec<Vec<usize>>) {
        for (index, child) in self.children.iter().enumerate() {
            prefix.push(index);
            if child.tag == tag {
                paths.push(prefix.clone());
            }
            child.collect_paths(tag, prefix, paths);
            prefix.pop();
        }
    }

    /// Follow a child-index path. The empty path is the node itself.
    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        path.iter()
            .try_fold(self, |node, &index| node.children.get(index))
    }

    /// Mutable variant of [`Node::node_at`].
    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        path.iter()
            .try_fold(self, |node, &index| node.children.get_mut(index))
    }

    /// Serialize the element without its tail.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        writer::write_node(&mut out, self);
        out
    }
}
