//! Plain-text processing: sentence detection and chunking.

pub mod chunker;
mod sentences;

pub use chunker::{chunk_text, chunk_text_with, DEFAULT_WORDS_PER_CHUNK};
pub use sentences::{RuleSplitter, SeamsSplitter, SentenceSplitter};
