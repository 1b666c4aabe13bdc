//! LLM provider implementations

mod gemini;
pub mod mock;
mod openai_compatible;
mod straico;

pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use openai_compatible::{DEFAULT_TEMPERATURE, OpenAICompatibleProvider};
pub use straico::StraicoProvider;

use crate::config::{ModelPreset, ProviderConfig};
use crate::error::{LlmError, Result};
use crate::provider::LlmProvider;

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenAI,
    OpenRouter,
    Straico,
}

impl ProviderKind {
    /// Parse provider kind from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            "openrouter" => Ok(Self::OpenRouter),
            "straico" => Ok(Self::Straico),
            _ => Err(LlmError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GENAI_API_KEY",
            Self::OpenAI => "OPENAI_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
            Self::Straico => "STRAICO_API_KEY",
        }
    }

    /// Human-readable provider name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gemini => "Google Gemini",
            Self::OpenAI => "OpenAI",
            Self::OpenRouter => "OpenRouter",
            Self::Straico => "Straico",
        }
    }
}

/// Create a provider instance from a preset and optional config
///
/// Fails with [`LlmError::MissingApiKey`] before any request is made when no
/// credential is configured.
pub fn get_provider(
    preset: &ModelPreset,
    provider_config: Option<&ProviderConfig>,
) -> Result<Box<dyn LlmProvider>> {
    let kind = ProviderKind::from_str(&preset.provider)?;
    let api_key = get_api_key(provider_config, kind)?;
    let base_url = provider_config.and_then(|c| c.base_url.as_deref());

    match kind {
        ProviderKind::Gemini => Ok(Box::new(GeminiProvider::new(
            &preset.model,
            api_key,
            base_url,
        )?)),
        ProviderKind::OpenAI => Ok(Box::new(OpenAICompatibleProvider::openai(
            &preset.model,
            api_key,
            base_url,
        )?)),
        ProviderKind::OpenRouter => Ok(Box::new(OpenAICompatibleProvider::openrouter(
            &preset.model,
            api_key,
            base_url,
        )?)),
        ProviderKind::Straico => Ok(Box::new(StraicoProvider::new(
            &preset.model,
            api_key,
            base_url,
        )?)),
    }
}

/// Get API key from config or environment variable
fn get_api_key(config: Option<&ProviderConfig>, kind: ProviderKind) -> Result<String> {
    // Check config first
    if let Some(key) = config.and_then(|c| c.api_key.clone()) {
        return Ok(key);
    }

    // Fall back to environment variable
    std::env::var(kind.env_var())
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| LlmError::MissingApiKey {
            provider: kind.display_name().to_string(),
            env_var: kind.env_var().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_from_str() {
        assert_eq!(ProviderKind::from_str("Gemini").unwrap(), ProviderKind::Gemini);
        assert_eq!(ProviderKind::from_str("google").unwrap(), ProviderKind::Gemini);
        assert_eq!(ProviderKind::from_str("openai").unwrap(), ProviderKind::OpenAI);
        assert_eq!(ProviderKind::from_str("straico").unwrap(), ProviderKind::Straico);
        assert!(ProviderKind::from_str("claude-cli").is_err());
    }

    #[test]
    fn test_api_key_from_config_wins() {
        let config = ProviderConfig {
            api_key: Some("from-config".to_string()),
            base_url: None,
        };
        let key = get_api_key(Some(&config), ProviderKind::Straico).unwrap();
        assert_eq!(key, "from-config");
    }

    #[test]
    fn test_get_provider_with_configured_key() {
        let preset = ModelPreset {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
        };
        let config = ProviderConfig {
            api_key: Some("sk-test".to_string()),
            base_url: None,
        };
        let provider = get_provider(&preset, Some(&config)).unwrap();
        assert_eq!(provider.name(), "OpenAI");
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let preset = ModelPreset {
            provider: "nope".to_string(),
            model: "x".to_string(),
        };
        assert!(matches!(
            get_provider(&preset, None),
            Err(LlmError::ConfigError(_))
        ));
    }
}
