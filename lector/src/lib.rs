//! lector - LLM-assisted copy editing of plain-text and XML documents
//!
//! Documents are cut into word-bounded chunks, each chunk is rewritten by an
//! LLM, and a rewrite of XML content is accepted only if its tags are
//! unchanged and it parses back into the tree.

pub mod audit;
pub mod checkpoint;
pub mod chunk;
pub mod config;
pub mod fidelity;
pub mod markup;
pub mod paths;
pub mod pipeline;
pub mod prompts;
pub mod rewrite;
pub mod split;
pub mod text;

pub use chunk::{chunk_document, Chunk};
pub use fidelity::{diff_positions, tags_match, TagDiff};
pub use markup::{normalize, Fragment, Node, ParseFailure};
pub use split::split_on_marker;
pub use text::chunk_text;
