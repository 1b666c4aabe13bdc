//! Word-bounded chunking of plain text along sentence boundaries.

use super::sentences::{SeamsSplitter, SentenceSplitter};

/// Default word budget per chunk.
pub const DEFAULT_WORDS_PER_CHUNK: usize = 1500;

/// Split `text` into chunks of whole sentences, each at most
/// `words_per_chunk` words unless a single sentence is longer.
pub fn chunk_text(text: &str, words_per_chunk: usize) -> Vec<String> {
    chunk_text_with(&SeamsSplitter, text, words_per_chunk)
}

/// [`chunk_text`] with an explicit sentence splitter.
///
/// Sentences are packed greedily. Words inside a chunk are joined by single
/// spaces. Empty input gives no chunks.
pub fn chunk_text_with(
    splitter: &dyn SentenceSplitter,
    text: &str,
    words_per_chunk: usize,
) -> Vec<String> {
    let budget = words_per_chunk.max(1);
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    let sentences = splitter.split(text);
    for sentence in &sentences {
        let words: Vec<&str> = sentence.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }
        if !current.is_empty() && current.len() + words.len() > budget {
            chunks.push(current.join(" "));
            current.clear();
        }
        current.extend(words);
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}
