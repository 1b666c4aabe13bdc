//! Shared LLM client library for the lector workspace
//!
//! Provides a unified interface for multiple LLM providers:
//! - Google Gemini (combined prompt)
//! - OpenAI and OpenRouter (system/user roles)
//! - Straico (combined prompt)
//!
//! plus bounded retry with exponential backoff for transient failures.

pub mod config;
pub mod error;
pub mod provider;
pub mod providers;
pub mod retry;

pub use config::{Config, ModelPreset, ProviderConfig};
pub use error::{LlmError, Result};
pub use provider::{LlmProvider, LlmRequest, LlmResponse, TokenUsage};
pub use providers::{MockProvider, ProviderKind, get_provider};
pub use retry::{RetryPolicy, complete_with_retry};
