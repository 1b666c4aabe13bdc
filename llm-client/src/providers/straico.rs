//! Straico provider
//!
//! Prompt-completion endpoint that takes a single combined message and wraps
//! the underlying model's answer in a `data.completion` envelope.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, LlmRequest, LlmResponse};

const STRAICO_API_URL: &str = "https://api.straico.com/v0/prompt/completion";

/// Provider for the Straico prompt-completion API
pub struct StraicoProvider {
    model: String,
    api_key: String,
    url: String,
    client: Client,
}

impl StraicoProvider {
    /// Create a new Straico provider
    pub fn new(model: &str, api_key: String, base_url: Option<&str>) -> Result<Self> {
        Ok(Self {
            model: model.to_string(),
            api_key,
            url: base_url.unwrap_or(STRAICO_API_URL).to_string(),
            client: Client::new(),
        })
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    data: Data,
}

#[derive(Debug, Deserialize)]
struct Data {
    completion: Completion,
}

#[derive(Debug, Deserialize)]
struct Completion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn extract_content(response: CompletionResponse) -> Result<String> {
    response
        .data
        .completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| LlmError::ApiError {
            message: "Response contains no message content".to_string(),
            status_code: None,
        })
}

#[async_trait]
impl LlmProvider for StraicoProvider {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let body = CompletionRequest {
            model: self.model.clone(),
            message: request.combined_prompt(),
        };

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(LlmError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status.as_u16(), error_text));
        }

        let api_response: CompletionResponse =
            response.json().await.map_err(|e| LlmError::ApiError {
                message: format!("Failed to parse response: {}", e),
                status_code: None,
            })?;

        Ok(LlmResponse {
            content: extract_content(api_response)?,
            model: self.model.clone(),
            usage: None,
        })
    }

    fn name(&self) -> &'static str {
        "Straico"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_content() {
        let json = r#"{"data": {"completion": {"choices": [{"message": {"role": "assistant", "content": "<p>Neu</p>"}}]}}}"#;
        let response: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(extract_content(response).unwrap(), "<p>Neu</p>");
    }

    #[test]
    fn test_missing_content_is_an_error() {
        let json = r#"{"data": {"completion": {"choices": [{"message": {"role": "assistant"}}]}}}"#;
        let response: CompletionResponse = serde_json::from_str(json).unwrap();
        assert!(extract_content(response).is_err());
    }
}
