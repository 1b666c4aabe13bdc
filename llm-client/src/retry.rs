//! Bounded retry with exponential backoff.

use std::time::Duration;

use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, LlmRequest, LlmResponse};

/// Default number of attempts for a single request.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default backoff factor in seconds.
pub const DEFAULT_BACKOFF_FACTOR: f32 = 0.3;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before retry `n` is `backoff_factor * 2^n` seconds
    pub backoff_factor: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the failed attempt with the given 0-based index.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.max(0.0);
        if factor == 0.0 {
            return Duration::ZERO;
        }
        // Large attempt counts overflow; saturate instead of panicking.
        Duration::try_from_secs_f32(factor * 2f32.powi(attempt.min(i32::MAX as u32) as i32))
            .unwrap_or(Duration::MAX)
    }
}

/// Run a completion, retrying transient failures.
///
/// Non-retryable errors are returned immediately. When every attempt failed
/// with a retryable error the result is [`LlmError::RetriesExhausted`].
pub async fn complete_with_retry(
    provider: &dyn LlmProvider,
    request: &LlmRequest,
    policy: &RetryPolicy,
) -> Result<LlmResponse> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        log::debug!(
            "Requesting completion from {} (attempt {}/{})",
            provider.name(),
            attempt + 1,
            max_attempts
        );

        match provider.complete(request.clone()).await {
            Ok(response) => return Ok(response),
            Err(e) if e.is_retryable() => {
                if attempt + 1 >= max_attempts {
                    log::error!("Maximum number of attempts reached: {}", e);
                    return Err(LlmError::RetriesExhausted {
                        attempts: max_attempts,
                        last_error: e.to_string(),
                    });
                }

                let delay = policy.delay_for(attempt);
                log::warn!("{}. Retrying in {:?}...", e, delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff_factor: 0.0,
        }
    }

    fn connection_error() -> LlmError {
        LlmError::Connection {
            message: "connection refused".to_string(),
        }
    }

    #[test]
    fn test_delay_grows_exponentially() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs_f32(0.3));
        assert_eq!(policy.delay_for(1), Duration::from_secs_f32(0.6));
        assert_eq!(policy.delay_for(3), Duration::from_secs_f32(2.4));
    }

    #[test]
    fn test_delay_saturates_for_large_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(200), Duration::MAX);
        assert_eq!(policy.delay_for(u32::MAX), Duration::MAX);

        let instant = RetryPolicy {
            max_attempts: 500,
            backoff_factor: 0.0,
        };
        assert_eq!(instant.delay_for(300), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let provider = MockProvider::fails_then_succeeds(2, connection_error(), "done");
        let request = LlmRequest::new("prompt", "text");

        let response = complete_with_retry(&provider, &request, &instant_policy(5))
            .await
            .unwrap();
        assert_eq!(response.content, "done");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let provider = MockProvider::always_fails(connection_error());
        let request = LlmRequest::new("prompt", "text");

        let err = complete_with_retry(&provider, &request, &instant_policy(5))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LlmError::RetriesExhausted { attempts: 5, .. }
        ));
        assert_eq!(provider.call_count(), 5);
    }

    #[tokio::test]
    async fn test_non_retryable_error_is_returned_immediately() {
        let provider = MockProvider::always_fails(LlmError::ApiError {
            message: "invalid model".to_string(),
            status_code: Some(400),
        });
        let request = LlmRequest::new("prompt", "text");

        let err = complete_with_retry(&provider, &request, &instant_policy(5))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::ApiError { .. }));
        assert_eq!(provider.call_count(), 1);
    }
}
