//! Mock LLM provider for testing
//!
//! Simulates transient failures and answers with a scripted rewrite of the
//! request, so pipelines can be exercised without network access.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, LlmRequest, LlmResponse};

type Responder = Box<dyn Fn(&LlmRequest) -> String + Send + Sync>;

/// A mock provider for testing retry and rewrite behavior
pub struct MockProvider {
    /// Number of times to fail before succeeding (0 = always succeed)
    fail_count: AtomicUsize,
    /// Calls from this index on fail (usize::MAX = never)
    fail_after: AtomicUsize,
    /// Current call count
    call_count: AtomicUsize,
    /// Error to return on failure (None = always succeed)
    fail_with: Mutex<Option<LlmError>>,
    /// Produces the response content on success
    responder: Responder,
    /// Prompts received, in call order
    received: Mutex<Vec<String>>,
    /// Provider name for display
    name: &'static str,
}

impl MockProvider {
    fn with_responder(responder: Responder) -> Self {
        Self {
            fail_count: AtomicUsize::new(0),
            fail_after: AtomicUsize::new(usize::MAX),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(None),
            responder,
            received: Mutex::new(Vec::new()),
            name: "mock",
        }
    }

    /// Create a provider that fails `n` times with the given error, then succeeds
    pub fn fails_then_succeeds(n: usize, error: LlmError, response: &str) -> Self {
        let provider = Self::always_succeeds(response);
        provider.fail_count.store(n, Ordering::SeqCst);
        *provider.fail_with.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
        provider
    }

    /// Create a provider that echoes the first `n` requests, then always fails
    pub fn succeeds_then_fails(n: usize, error: LlmError) -> Self {
        let provider = Self::echo();
        provider.fail_after.store(n, Ordering::SeqCst);
        *provider.fail_with.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
        provider
    }

    /// Create a provider that always fails with the given error
    pub fn always_fails(error: LlmError) -> Self {
        Self::fails_then_succeeds(usize::MAX, error, "")
    }

    /// Create a provider that always succeeds with a fixed response
    pub fn always_succeeds(response: &str) -> Self {
        let response = response.to_string();
        Self::with_responder(Box::new(move |_| response.clone()))
    }

    /// Create a provider that returns the user content unchanged
    pub fn echo() -> Self {
        Self::with_responder(Box::new(|request| request.prompt.clone()))
    }

    /// Create a provider that rewrites the user content with a closure
    pub fn rewriting<F>(rewrite: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self::with_responder(Box::new(move |request| rewrite(&request.prompt)))
    }

    /// Get the number of times complete() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// User prompts received so far
    pub fn received_prompts(&self) -> Vec<String> {
        self.received.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Set a custom provider name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        let fail_count = self.fail_count.load(Ordering::SeqCst);

        let fail_after = self.fail_after.load(Ordering::SeqCst);

        if call_num < fail_count || call_num >= fail_after {
            let error = self.fail_with.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(err) = error.as_ref() {
                return Err(clone_error(err));
            }
        }

        self.received.lock().unwrap_or_else(|e| e.into_inner()).push(request.prompt.clone());

        Ok(LlmResponse {
            content: (self.responder)(&request),
            model: "mock-model".to_string(),
            usage: None,
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Clone an LlmError (needed because LlmError doesn't implement Clone)
fn clone_error(err: &LlmError) -> LlmError {
    match err {
        LlmError::ServerOverloaded { message } => LlmError::ServerOverloaded {
            message: message.clone(),
        },
        LlmError::Connection { message } => LlmError::Connection {
            message: message.clone(),
        },
        LlmError::MissingApiKey { provider, env_var } => LlmError::MissingApiKey {
            provider: provider.clone(),
            env_var: env_var.clone(),
        },
        LlmError::RateLimited { retry_after } => LlmError::RateLimited {
            retry_after: *retry_after,
        },
        LlmError::ApiError {
            message,
            status_code,
        } => LlmError::ApiError {
            message: message.clone(),
            status_code: *status_code,
        },
        LlmError::RetriesExhausted {
            attempts,
            last_error,
        } => LlmError::RetriesExhausted {
            attempts: *attempts,
            last_error: last_error.clone(),
        },
        LlmError::ConfigError(s) => LlmError::ConfigError(s.clone()),
        LlmError::InvalidPreset(s) => LlmError::InvalidPreset(s.clone()),
        // Io and Toml errors can't be cloned
        LlmError::Io(_) => LlmError::ConfigError("IO error (mock)".to_string()),
        LlmError::TomlParse(_) => LlmError::ConfigError("TOML parse error (mock)".to_string()),
        LlmError::TomlSerialize(_) => {
            LlmError::ConfigError("TOML serialize error (mock)".to_string())
        }
    }
}
