//! The rewrite collaborator as seen by the pipelines.

use anyhow::{Context, Result};
use llm_client::{
    complete_with_retry, get_provider, Config, LlmError, LlmProvider, LlmRequest, RetryPolicy,
};

/// Result of asking the service to rewrite one piece of content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    Rewritten(String),
    /// The service answered with a non-retryable error
    Failed(String),
}

/// Sends content to an LLM provider with retries.
pub struct Rewriter<'a> {
    provider: &'a dyn LlmProvider,
    policy: RetryPolicy,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl<'a> Rewriter<'a> {
    pub fn new(provider: &'a dyn LlmProvider, policy: RetryPolicy) -> Self {
        Self {
            provider,
            policy,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Rewrite `content` under `system_prompt`.
    ///
    /// Service errors become [`RewriteOutcome::Failed`]. Running out of
    /// retries on connection failures is an error: the run cannot continue.
    pub async fn rewrite(&self, system_prompt: &str, content: &str) -> Result<RewriteOutcome> {
        let mut request = LlmRequest::new(system_prompt, content);
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;

        match complete_with_retry(self.provider, &request, &self.policy).await {
            Ok(response) => {
                if let Some(usage) = &response.usage {
                    log::debug!(
                        "Tokens: {} in, {} out",
                        usage.input_tokens,
                        usage.output_tokens
                    );
                }
                Ok(RewriteOutcome::Rewritten(response.content))
            }
            Err(e @ LlmError::RetriesExhausted { .. }) => {
                Err(e).context(format!("{} is unreachable", self.provider.name()))
            }
            Err(e) => {
                log::error!("Error from {}: {}", self.provider.name(), e);
                Ok(RewriteOutcome::Failed(e.to_string()))
            }
        }
    }
}

/// Build the provider for `preset_name`, or the configured default.
///
/// Fails before any work starts if the preset is unknown or its credentials
/// are missing.
pub fn load_provider(preset_name: Option<&str>) -> Result<Box<dyn LlmProvider>> {
    let config = Config::load().context("Failed to load LLM configuration")?;

    let preset_name = preset_name.unwrap_or_else(|| config.get_default_for_program("lector"));
    let preset = config
        .get_preset(preset_name)
        .context(format!("Unknown preset: {}", preset_name))?;

    let provider_config = config.get_provider_config(&preset.provider);
    let provider = get_provider(preset, provider_config).context(format!(
        "Failed to initialize provider '{}' for preset '{}'",
        preset.provider, preset_name
    ))?;

    log::info!(
        "Using LLM provider: {} (model: {})",
        provider.name(),
        preset.model
    );
    Ok(provider)
}
