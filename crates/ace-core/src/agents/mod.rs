//! The three agent roles and the policy they share for calling the model.
//!
//! Every role talks to the model through [`ModelCallPolicy::call`], which
//! bounds each attempt with a timeout and retries transient failures with a
//! linearly growing delay.

pub mod curator;
pub mod generator;
pub mod prompts;
pub mod reflector;

use std::time::Duration;

use ace_abstraction::{ChatMessage, Model, ModelError, ModelParameters, ModelResponse, ToolDefinition};
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::playbook::PlaybookError;

pub use curator::Curator;
pub use generator::Generator;
pub use prompts::{CuratorContext, DefaultPrompts, GeneratorContext, PromptSet, ReflectorContext};
pub use reflector::Reflector;

/// Errors raised by an agent role.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model call failed after retries.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Persisting a playbook change failed.
    #[error(transparent)]
    Playbook(#[from] PlaybookError),
}

/// Result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Timeout and retry settings for model calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelCallPolicy {
    /// Budget for a single attempt.
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before retry `n` is `backoff * n`.
    pub backoff: Duration,
}

impl Default for ModelCallPolicy {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(120), max_retries: 2, backoff: Duration::from_secs(1) }
    }
}

impl ModelCallPolicy {
    /// Creates a policy.
    pub fn new(timeout: Duration, max_retries: u32, backoff: Duration) -> Self {
        Self { timeout, max_retries, backoff }
    }

    /// Whether an error is worth another attempt.
    ///
    /// Quota, provider and serialization errors are not.
    pub fn is_retryable(error: &ModelError) -> bool {
        matches!(error, ModelError::RequestError(_) | ModelError::Timeout(_) | ModelError::ModelResponseError(_))
    }

    /// Calls the model under this policy.
    pub async fn call(
        &self,
        model: &dyn Model,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        parameters: Option<ModelParameters>,
    ) -> std::result::Result<ModelResponse, ModelError> {
        let mut retry_count = 0;
        loop {
            let attempt = timeout(self.timeout, model.generate_chat_completion(messages, tools, parameters.clone()));
            let result = match attempt.await {
                Ok(result) => result,
                Err(_) => Err(ModelError::Timeout(self.timeout.as_secs())),
            };

            match result {
                Ok(response) => {
                    debug!(
                        model_id = %model.model_id(),
                        tool_calls = response.tool_calls.len(),
                        retry_count,
                        "Model call succeeded"
                    );
                    return Ok(response);
                }
                Err(e) if retry_count < self.max_retries && Self::is_retryable(&e) => {
                    retry_count += 1;
                    let delay = self.backoff * retry_count;
                    warn!(
                        model_id = %model.model_id(),
                        error = %e,
                        retry_count,
                        delay_ms = delay.as_millis() as u64,
                        "Model call failed, retrying after backoff"
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
