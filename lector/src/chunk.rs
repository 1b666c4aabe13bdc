//! Markup-aware chunking of an element.
//!
//! An element within the budget is one chunk holding the element itself,
//! tags included. A larger element is cut into consecutive runs of its mixed
//! content. Text runs are cut only before a word; child elements are never
//! split, so a child larger than the budget becomes a chunk of its own.

use crate::markup::{parse_fragment, write_fragments, Fragment, Node, ParseFailure};

/// A contiguous slice of an element's content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    fragments: Vec<Fragment>,
}

impl Chunk {
    /// Parse rewritten markup back into a chunk.
    pub fn parse(markup: &str) -> Result<Self, ParseFailure> {
        Ok(Self::from_fragments(parse_fragment(markup)?))
    }

    pub fn from_fragments(fragments: impl IntoIterator<Item = Fragment>) -> Self {
        let mut chunk = Self::default();
        for fragment in fragments {
            chunk.push(fragment);
        }
        chunk
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn into_fragments(self) -> Vec<Fragment> {
        self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.fragments.iter().map(Fragment::word_count).sum()
    }

    /// Character data of the chunk with all markup removed.
    pub fn text_content(&self) -> String {
        self.fragments.iter().map(Fragment::text_content).collect()
    }

    /// The element this chunk consists of, if it is exactly one element.
    pub fn as_element(&self) -> Option<&Node> {
        match self.fragments.as_slice() {
            [Fragment::Node(node)] => Some(node),
            _ => None,
        }
    }

    /// True if the chunk is `root` itself rather than a run of its content.
    pub fn is_whole(&self, root: &Node) -> bool {
        self.as_element().is_some_and(|node| {
            node.tag == root.tag
                && node.attributes == root.attributes
                && node.text == root.text
                && node.children == root.children
        })
    }

    /// Serialized content, suitable for sending to the rewrite service.
    pub fn to_markup(&self) -> String {
        write_fragments(&self.fragments)
    }

    fn push(&mut self, fragment: Fragment) {
        match (self.fragments.last_mut(), fragment) {
            (_, Fragment::Text(text)) if text.is_empty() => {}
            (Some(Fragment::Text(last)), Fragment::Text(text)) => last.push_str(&text),
            (_, fragment) => self.fragments.push(fragment),
        }
    }
}

/// Chunk `root` for rewriting.
///
/// If `root` has at most `words_per_chunk` words the result is one whole
/// chunk (see [`Chunk::is_whole`]) holding `root` without its tail.
/// Otherwise the content is cut into chunks of at most `words_per_chunk`
/// words whose fragments concatenate to the content. An element without
/// content yields no chunks.
pub fn chunk_document(root: &Node, words_per_chunk: usize) -> Vec<Chunk> {
    if root.has_no_content() {
        return Vec::new();
    }
    if root.word_count() <= words_per_chunk {
        let mut element = root.clone();
        element.tail.clear();
        return vec![Chunk::from_fragments([Fragment::Node(element)])];
    }

    let mut builder = ChunkBuilder::new(words_per_chunk.max(1));
    for fragment in root.content() {
        match fragment {
            Fragment::Text(text) => {
                for piece in word_pieces(&text) {
                    builder.add(
                        Fragment::Text(piece.to_string()),
                        piece.split_whitespace().count(),
                    );
                }
            }
            Fragment::Node(node) => {
                let words = node.word_count();
                builder.add(Fragment::Node(node), words);
            }
        }
    }
    builder.finish()
}

struct ChunkBuilder {
    budget: usize,
    chunks: Vec<Chunk>,
    current: Chunk,
    words: usize,
}

impl ChunkBuilder {
    fn new(budget: usize) -> Self {
        Self {
            budget,
            chunks: Vec::new(),
            current: Chunk::default(),
            words: 0,
        }
    }

    fn add(&mut self, fragment: Fragment, words: usize) {
        if self.words > 0 && self.words + words > self.budget {
            self.flush();
        }
        self.current.push(fragment);
        self.words += words;
    }

    fn flush(&mut self) {
        let chunk = std::mem::take(&mut self.current);
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
        self.words = 0;
    }

    fn finish(mut self) -> Vec<Chunk> {
        self.flush();
        self.chunks
    }
}

/// Cut text so that each piece holds at most one word. Pieces start at a word
/// (except possibly the first, which keeps leading whitespace) and carry the
/// whitespace that follows it.
fn word_pieces(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut seen_word = false;
    let mut previous_blank = true;

    for (index, c) in text.char_indices() {
        let blank = c.is_whitespace();
        if !blank && previous_blank {
            if seen_word {
                pieces.push(&text[start..index]);
                start = index;
            }
            seen_word = true;
        }
        previous_blank = blank;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::markup::{parse_document, strategies};

    #[test]
    fn test_word_pieces() {
        assert_eq!(word_pieces("  one two\nthree "), vec!["  one ", "two\n", "three "]);
        assert_eq!(word_pieces("   "), vec!["   "]);
        assert!(word_pieces("").is_empty());
    }

    #[test]
    fn test_small_element_is_one_chunk() {
        let root = parse_document("<p>Hello <b>bold</b> world</p>").unwrap();
        let chunks = chunk_document(&root, 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].to_markup(), "<p>Hello <b>bold</b> world</p>");
        assert_eq!(chunks[0].word_count(), 3);
        assert!(chunks[0].is_whole(&root));
    }

    #[test]
    fn test_whole_chunk_keeps_element_tags() {
        let root = parse_document("<p>Hello<b>world</b>!</p>").unwrap();
        let chunks = chunk_document(&root, 100);
        assert_eq!(chunks.len(), 1);

        let markup = chunks[0].to_markup();
        assert_eq!(markup, "<p>Hello<b>world</b>!</p>");
        assert_eq!(
            crate::fidelity::extract_tags(&markup),
            vec!["<p>", "<b>", "</b>", "</p>"]
        );
        assert_eq!(parse_document(&markup).unwrap(), root);
    }

    #[test]
    fn test_whole_chunk_drops_tail() {
        let mut root = parse_document("<p>kurz</p>").unwrap();
        root.tail = "\n".to_string();
        let chunks = chunk_document(&root, 5);
        assert_eq!(chunks[0].to_markup(), "<p>kurz</p>");
        assert!(chunks[0].is_whole(&root));
    }

    #[test]
    fn test_single_child_chunk_is_not_whole() {
        let root = parse_document("<p><p>eins zwei drei</p></p>").unwrap();
        let chunks = chunk_document(&root, 2);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].to_markup(), "<p>eins zwei drei</p>");
        assert!(!chunks[0].is_whole(&root));
    }

    #[test]
    fn test_text_split_at_word_boundaries() {
        let root = parse_document("<p>one two three four five</p>").unwrap();
        let chunks: Vec<String> = chunk_document(&root, 2).iter().map(Chunk::to_markup).collect();
        assert_eq!(chunks, vec!["one two ", "three four ", "five"]);
    }

    #[test]
    fn test_oversized_element_stands_alone() {
        let root = parse_document("<p>a <q>b c d e</q> f</p>").unwrap();
        let chunks: Vec<String> = chunk_document(&root, 2).iter().map(Chunk::to_markup).collect();
        assert_eq!(chunks, vec!["a ", "<q>b c d e</q>", " f"]);
    }

    #[test]
    fn test_empty_element_has_no_chunks() {
        let root = parse_document("<p/>").unwrap();
        assert!(chunk_document(&root, 5).is_empty());
    }

    #[test]
    fn test_wordless_elements_join_neighbours() {
        let root = parse_document("<p>one<br/>two</p>").unwrap();
        let chunks: Vec<String> = chunk_document(&root, 1).iter().map(Chunk::to_markup).collect();
        assert_eq!(chunks, vec!["one<br />", "two"]);
    }

    #[test]
    fn test_chunk_parse() {
        let chunk = Chunk::parse("lead <i>x</i> tail").unwrap();
        assert_eq!(chunk.fragments().len(), 3);
        assert_eq!(chunk.text_content(), "lead x tail");
        assert!(Chunk::parse("lead <i>x tail").is_err());
    }

    proptest! {
        #[test]
        fn prop_chunks_reassemble_to_document(root in strategies::document(), budget in 1usize..15) {
            let chunks = chunk_document(&root, budget);
            let markup: String = chunks.iter().map(Chunk::to_markup).collect();
            let whole = matches!(chunks.as_slice(), [chunk] if chunk.is_whole(&root));
            let rebuilt = if whole {
                parse_document(&markup).unwrap()
            } else {
                parse_document(&format!("<body>{}</body>", markup)).unwrap()
            };
            prop_assert_eq!(rebuilt, root);
        }

        #[test]
        fn prop_chunks_parse_standalone(root in strategies::document(), budget in 1usize..15) {
            for chunk in chunk_document(&root, budget) {
                let reparsed = Chunk::parse(&chunk.to_markup()).unwrap();
                prop_assert_eq!(reparsed, chunk);
            }
        }

        #[test]
        fn prop_chunks_within_budget_unless_single_element(
            root in strategies::document(),
            budget in 1usize..15,
        ) {
            for chunk in chunk_document(&root, budget) {
                let oversized_single = chunk
                    .fragments()
                    .iter()
                    .any(|f| matches!(f, Fragment::Node(n) if n.word_count() > budget));
                prop_assert!(chunk.word_count() <= budget || oversized_single);
            }
        }
    }
}
