use std::time::Duration;

use crate::{Llm, LlmRequest, LlmResponse, StepwiseError};

/// Retries transient model-client failures with exponential backoff.
///
/// This is the only retry layer in the workspace: the agent executor treats a
/// model call as atomic and never retries on its own.
pub struct Retrying<L> {
    llm: L,
    max_attempts: usize,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl<L> Retrying<L> {
    pub fn new(llm: L, max_attempts: usize) -> Self {
        Self {
            llm,
            max_attempts,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    fn backoff_for(&self, attempt: usize) -> Duration {
        let exponent = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX).min(16);
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(self.max_backoff)
    }
}

pub fn is_retryable(error: &StepwiseError) -> bool {
    matches!(
        error,
        StepwiseError::LlmProvider(_) | StepwiseError::Timeout(_)
    )
}

#[async_trait::async_trait]
impl<L> Llm for Retrying<L>
where
    L: Llm,
{
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, StepwiseError> {
        if self.max_attempts == 0 {
            return Err(StepwiseError::MaxRetriesExceeded {
                max: 0,
                last_error: "no attempts allowed".to_string(),
            });
        }

        let mut last_error = String::new();
        for attempt in 1..=self.max_attempts {
            match self.llm.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(error) => {
                    if !is_retryable(&error) {
                        return Err(error);
                    }

                    if attempt == self.max_attempts {
                        tracing::warn!(attempt, error = %error, "model request failed; retries exhausted");
                        last_error = error.to_string();
                        break;
                    }

                    let delay = self.backoff_for(attempt);
                    tracing::warn!(attempt, ?delay, error = %error, "model request failed; retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(StepwiseError::MaxRetriesExceeded {
            max: self.max_attempts,
            last_error,
        })
    }
}
