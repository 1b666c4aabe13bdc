//! Checks that a rewrite kept the markup of the original intact.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::chunk::Chunk;
use crate::markup::ParseFailure;

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Every tag in `markup` in order of appearance, with internal whitespace
/// collapsed so `<br/>` and `<br />` compare equal.
pub fn extract_tags(markup: &str) -> Vec<String> {
    TAG_PATTERN
        .find_iter(markup)
        .map(|m| normalize_tag(m.as_str()))
        .collect()
}

fn normalize_tag(tag: &str) -> String {
    let collapsed = WHITESPACE.replace_all(tag, " ");
    collapsed
        .replace(" />", "/>")
        .replace("< ", "<")
        .replace(" >", ">")
}

/// True iff both strings contain the same tag sequence.
pub fn tags_match(original: &str, rewritten: &str) -> bool {
    extract_tags(original) == extract_tags(rewritten)
}

/// Remove all tags, leaving only text.
pub fn strip_tags(markup: &str) -> String {
    TAG_PATTERN.replace_all(markup, "").into_owned()
}

/// A position where the two tag sequences differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDiff {
    pub index: usize,
    pub original: Option<String>,
    pub rewritten: Option<String>,
}

/// Positions at which the tag sequences differ, for diagnostics.
pub fn diff_positions(original: &[String], rewritten: &[String]) -> Vec<TagDiff> {
    (0..original.len().max(rewritten.len()))
        .filter_map(|index| {
            let left = original.get(index);
            let right = rewritten.get(index);
            (left != right).then(|| TagDiff {
                index,
                original: left.cloned(),
                rewritten: right.cloned(),
            })
        })
        .collect()
}

/// Why a rewritten chunk was not accepted.
#[derive(Debug, Error)]
pub enum Rejection {
    #[error("XML tags in content and response do not match ({} differing positions)", .0.len())]
    TagMismatch(Vec<TagDiff>),

    #[error("Response is not well-formed: {0}")]
    Malformed(#[from] ParseFailure),
}

/// Accept a rewrite only if its tags match the original and it parses.
pub fn verify_rewrite(original: &str, rewritten: &str) -> Result<Chunk, Rejection> {
    let original_tags = extract_tags(original);
    let rewritten_tags = extract_tags(rewritten);
    if original_tags != rewritten_tags {
        return Err(Rejection::TagMismatch(diff_positions(
            &original_tags,
            &rewritten_tags,
        )));
    }
    Ok(Chunk::parse(rewritten)?)
}
