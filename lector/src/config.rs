//! lector configuration: chunking, thresholds, prompts and output layout.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::split::DEFAULT_SPLIT_MARKER;
use crate::text::DEFAULT_WORDS_PER_CHUNK;

const DEFAULT_MIN_WORDS_PARAGRAPH: usize = 5;
const DEFAULT_MIN_WORDS_ARTICLE: usize = 50;
const DEFAULT_TEMPERATURE: f32 = 0.6;

/// What to do with a chunk larger than the provider accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OversizePolicy {
    /// Send it anyway and let the provider decide
    #[default]
    Send,
    /// Keep the original content and record a failure
    KeepOriginal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LectorConfig {
    /// Word budget per chunk sent for rewriting
    #[serde(default = "default_words_per_chunk")]
    pub words_per_chunk: usize,

    /// Paragraphs with at most this many words are skipped
    #[serde(default = "default_min_words_paragraph")]
    pub min_words_paragraph: usize,

    /// Articles with at most this many words are skipped
    #[serde(default = "default_min_words_article")]
    pub min_words_article: usize,

    /// Literal text at which rewritten paragraphs are split
    #[serde(default = "default_split_marker")]
    pub split_marker: String,

    #[serde(default = "default_article_tag")]
    pub article_tag: String,

    #[serde(default = "default_paragraph_tag")]
    pub paragraph_tag: String,

    /// Attempts per chunk on connection failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff before retry n is `backoff_factor * 2^n` seconds
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Largest chunk (in words) the provider is expected to accept
    #[serde(default)]
    pub max_request_words: Option<usize>,

    #[serde(default)]
    pub oversize_policy: OversizePolicy,

    /// Directory for output, checkpoint and log files (default: next to input)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// System prompt file for text mode
    #[serde(default)]
    pub text_prompt: Option<PathBuf>,

    /// System prompt file for paragraph mode
    #[serde(default)]
    pub paragraph_prompt: Option<PathBuf>,

    /// System prompt file for article mode
    #[serde(default)]
    pub article_prompt: Option<PathBuf>,
}

fn default_words_per_chunk() -> usize {
    DEFAULT_WORDS_PER_CHUNK
}

fn default_min_words_paragraph() -> usize {
    DEFAULT_MIN_WORDS_PARAGRAPH
}

fn default_min_words_article() -> usize {
    DEFAULT_MIN_WORDS_ARTICLE
}

fn default_split_marker() -> String {
    DEFAULT_SPLIT_MARKER.to_string()
}

fn default_article_tag() -> String {
    "article".to_string()
}

fn default_paragraph_tag() -> String {
    "p".to_string()
}

fn default_max_retries() -> u32 {
    llm_client::retry::DEFAULT_MAX_ATTEMPTS
}

fn default_backoff_factor() -> f32 {
    llm_client::retry::DEFAULT_BACKOFF_FACTOR
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

impl Default for LectorConfig {
    fn default() -> Self {
        Self {
            words_per_chunk: default_words_per_chunk(),
            min_words_paragraph: default_min_words_paragraph(),
            min_words_article: default_min_words_article(),
            split_marker: default_split_marker(),
            article_tag: default_article_tag(),
            paragraph_tag: default_paragraph_tag(),
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
            temperature: default_temperature(),
            max_tokens: None,
            max_request_words: None,
            oversize_policy: OversizePolicy::default(),
            output_dir: None,
            text_prompt: None,
            paragraph_prompt: None,
            article_prompt: None,
        }
    }
}

impl LectorConfig {
    /// Get the config file path: ~/.config/cli-programs/lector.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("cli-programs")
            .join("lector.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: LectorConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn retry_policy(&self) -> llm_client::RetryPolicy {
        llm_client::RetryPolicy {
            max_attempts: self.max_retries.max(1),
            backoff_factor: self.backoff_factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LectorConfig::default();
        assert_eq!(config.words_per_chunk, 1500);
        assert_eq!(config.min_words_paragraph, 5);
        assert_eq!(config.min_words_article, 50);
        assert_eq!(config.split_marker, "StartAbsatz");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.backoff_factor, 0.3);
        assert_eq!(config.temperature, 0.6);
        assert_eq!(config.oversize_policy, OversizePolicy::Send);
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn test_config_path() {
        let path = LectorConfig::config_path().unwrap();
        assert!(path.ends_with("cli-programs/lector.toml"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config: LectorConfig = toml::from_str("").unwrap();
        assert_eq!(config.words_per_chunk, 1500);
        assert_eq!(config.paragraph_tag, "p");
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
words_per_chunk = 800
split_marker = "NEU"
max_request_words = 3000
oversize_policy = "keep-original"
output_dir = "/data/out"
paragraph_prompt = "/data/prompts/p.txt"
"#;
        let config: LectorConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.words_per_chunk, 800);
        assert_eq!(config.split_marker, "NEU");
        assert_eq!(config.max_request_words, Some(3000));
        assert_eq!(config.oversize_policy, OversizePolicy::KeepOriginal);
        assert_eq!(config.output_dir, Some(PathBuf::from("/data/out")));
        assert_eq!(config.min_words_article, 50);
    }

    #[test]
    fn test_serialize_round_trip() {
        let config = LectorConfig {
            max_tokens: Some(4096),
            ..LectorConfig::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: LectorConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.max_tokens, Some(4096));
        assert_eq!(parsed.split_marker, config.split_marker);
    }

    #[test]
    fn test_retry_policy() {
        let config = LectorConfig {
            max_retries: 0,
            ..LectorConfig::default()
        };
        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.backoff_factor, 0.3);
    }
}
