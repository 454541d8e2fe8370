//! Retry/Backoff Executor
//!
//! Wraps a single generation service call with a fixed attempt ceiling and a
//! linear backoff: the delay before retry `n + 1` is `n * base_delay`. Every
//! failure is retried alike; the classified category is only logged.
//!
//! The executor knows nothing about JSON. It hands back the message content
//! of the first successful call.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use super::provider::{ErrorClassifier, LlmResponse};
use crate::config::RetryConfig;
use crate::types::{CourseError, Result};

/// Attempt ceiling and backoff base
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.base_delay(),
        }
    }
}

impl RetryPolicy {
    /// Delay applied after the `failures`-th failed attempt
    pub fn delay_after(&self, failures: u32) -> Duration {
        self.base_delay * failures
    }
}

/// What happened during one `execute_with_stats` call
#[derive(Debug, Clone, Default)]
pub struct RetryStats {
    /// Calls made, successful one included
    pub attempts: u32,
    /// Backoff sleeps applied, in order
    pub delays: Vec<Duration>,
    /// Display form of every failure seen
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Run `call` until it succeeds or the attempt ceiling is hit
    pub async fn execute<F, Fut>(&self, operation: &str, call: F) -> Result<String>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<LlmResponse>>,
    {
        self.execute_with_stats(operation, call)
            .await
            .map(|(content, _)| content)
    }

    /// Same as [`RetryExecutor::execute`], also reporting the attempt schedule
    pub async fn execute_with_stats<F, Fut>(
        &self,
        operation: &str,
        mut call: F,
    ) -> Result<(String, RetryStats)>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<LlmResponse>>,
    {
        let mut stats = RetryStats::default();

        loop {
            stats.attempts += 1;
            debug!(
                operation,
                attempt = stats.attempts,
                max_attempts = self.policy.max_attempts,
                "Generation attempt"
            );

            match call().await {
                Ok(response) => {
                    debug!(
                        operation,
                        attempts = stats.attempts,
                        input_tokens = response.usage.input_tokens,
                        output_tokens = response.usage.output_tokens,
                        elapsed_ms = response.timing.total_ms,
                        "Generation succeeded"
                    );
                    return Ok((response.content, stats));
                }
                Err(err) => {
                    let category = err.category().unwrap_or_else(|| {
                        ErrorClassifier::classify(&err.to_string(), "unknown").category
                    });
                    warn!(
                        operation,
                        attempt = stats.attempts,
                        max_attempts = self.policy.max_attempts,
                        category = %category,
                        error = %err,
                        "Generation attempt failed"
                    );
                    stats.errors.push(err.to_string());

                    if stats.attempts >= self.policy.max_attempts {
                        return Err(CourseError::generation_service(
                            operation,
                            stats.attempts,
                            err,
                        ));
                    }

                    let delay = self.policy.delay_after(stats.attempts);
                    debug!(operation, delay_ms = delay.as_millis() as u64, "Backing off");
                    sleep(delay).await;
                    stats.delays.push(delay);
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
