//! Sentence detection for the plain-text chunker.

use seams::sentence_detector::dialog_detector::SentenceDetectorDialog;
use std::sync::OnceLock;

/// Splits text into sentences in reading order.
pub trait SentenceSplitter {
    fn split(&self, text: &str) -> Vec<String>;
}

/// Dialog-aware sentence detection via the seams library.
///
/// Falls back to [`RuleSplitter`] if the detector cannot be built or fails on
/// a given input.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeamsSplitter;

static DETECTOR: OnceLock<Option<SentenceDetectorDialog>> = OnceLock::new();

fn detector() -> Option<&'static SentenceDetectorDialog> {
    DETECTOR
        .get_or_init(|| match SentenceDetectorDialog::new() {
            Ok(detector) => Some(detector),
            Err(e) => {
                log::warn!("Sentence detector unavailable, using rule-based splitting: {:?}", e);
                None
            }
        })
        .as_ref()
}

impl SentenceSplitter for SeamsSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        let Some(detector) = detector() else {
            return RuleSplitter.split(text);
        };
        match detector.detect_sentences_borrowed(text) {
            Ok(sentences) => sentences
                .iter()
                .map(|s| s.normalize())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(e) => {
                log::warn!("Sentence detection failed, using rule-based splitting: {:?}", e);
                RuleSplitter.split(text)
            }
        }
    }
}

/// Terminal punctuation followed by whitespace ends a sentence.
///
/// Closing quotes and brackets directly after the punctuation stay with the
/// sentence. Every non-whitespace character of the input ends up in exactly
/// one sentence.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleSplitter;

impl SentenceSplitter for RuleSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut start = 0;
        let mut chars = text.char_indices().peekable();

        while let Some((_, c)) = chars.next() {
            if !matches!(c, '.' | '!' | '?' | '…') {
                continue;
            }
            while let Some(&(_, next)) = chars.peek() {
                if matches!(next, '.' | '!' | '?' | '…') || is_closing(next) {
                    chars.next();
                } else {
                    break;
                }
            }
            match chars.peek() {
                Some(&(end, next)) if next.is_whitespace() => {
                    push_trimmed(&mut sentences, &text[start..end]);
                    start = end;
                }
                None => {
                    push_trimmed(&mut sentences, &text[start..]);
                    start = text.len();
                }
                _ => {}
            }
        }
        push_trimmed(&mut sentences, &text[start..]);
        sentences
    }
}

fn is_closing(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '»' | '«' | '”' | '“' | '’')
}

fn push_trimmed(sentences: &mut Vec<String>, candidate: &str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_splitter_basic() {
        assert_eq!(RuleSplitter.split("A. B. C."), vec!["A.", "B.", "C."]);
    }

    #[test]
    fn test_rule_splitter_keeps_closing_quotes() {
        assert_eq!(
            RuleSplitter.split("Er sprach: „Komm!“ Dann ging er."),
            vec!["Er sprach: „Komm!“", "Dann ging er."]
        );
    }

    #[test]
    fn test_rule_splitter_no_break_inside_number() {
        assert_eq!(RuleSplitter.split("Vers 3.16 sagt es."), vec!["Vers 3.16 sagt es."]);
    }

    #[test]
    fn test_rule_splitter_trailing_fragment() {
        assert_eq!(RuleSplitter.split("One. two"), vec!["One.", "two"]);
    }

    #[test]
    fn test_rule_splitter_empty() {
        assert!(RuleSplitter.split("  \n ").is_empty());
    }

    #[test]
    fn test_seams_splitter_splits_sentences() {
        let sentences = SeamsSplitter.split("First sentence. Second sentence.");
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].contains("First"));
        assert!(sentences[1].contains("Second"));
    }
}
