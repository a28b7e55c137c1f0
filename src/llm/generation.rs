//! The generation client: the only path from the pipeline to a model provider.
//!
//! Two independent retry loops live here. The outer loop re-asks the model when
//! its output fails the schema; the inner loop retries transport failures with
//! exponential backoff. Both are bounded by the same `max_attempts` but count
//! separately, and both counters are local to one `generate` call.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::client::{CompletionParams, LlmClient};
use super::prompts;
use crate::config::{GenerationConfig, LlmConfig};
use crate::error::{GenerationError, LlmInvocationError, SchemaValidationError};
use crate::pipeline::schema::{parse_payload, ResponseSchema};
use crate::util::preview;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    /// Append a correction block quoting the violation on schema retries.
    pub tighten_on_retry: bool,
}

impl RetryPolicy {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            backoff_max: Duration::from_millis(config.backoff_max_ms),
            tighten_on_retry: config.tighten_on_retry,
        }
    }

    /// No sleeping between transport retries.
    pub fn immediate() -> Self {
        Self {
            backoff_base: Duration::ZERO,
            backoff_max: Duration::ZERO,
            tighten_on_retry: true,
        }
    }

    /// Delay after the `failures`-th consecutive transport failure: `base * 2^(failures-1)`, capped.
    pub fn delay_for(&self, failures: usize) -> Duration {
        let exponent = failures.saturating_sub(1).min(16) as u32;
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(self.backoff_max)
    }
}

pub struct GenerationClient {
    client: Arc<dyn LlmClient>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    policy: RetryPolicy,
}

impl GenerationClient {
    pub fn new(client: Arc<dyn LlmClient>, llm: &LlmConfig, generation: &GenerationConfig) -> Self {
        Self {
            client,
            model: llm.model.clone(),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            policy: RetryPolicy::from_config(generation),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn params(&self, system_prompt: Option<&str>) -> CompletionParams {
        CompletionParams {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            system_prompt: system_prompt.map(str::to_string),
            json_response: true,
        }
    }

    /// Send `prompt`, parse the reply with `schema`, and retry until it validates.
    ///
    /// Fails with [`LlmInvocationError`] when one request exhausts its transport
    /// retries, or [`SchemaValidationError`] after `max_attempts` rejected replies.
    pub async fn generate<S>(
        &self,
        prompt: &str,
        schema: &S,
        max_attempts: usize,
    ) -> Result<S::Output, GenerationError>
    where
        S: ResponseSchema + ?Sized,
    {
        let max_attempts = max_attempts.max(1);
        let params = self.params(schema.system_prompt());
        let mut request = prompt.to_string();
        let mut last_violation = String::new();
        let mut last_payload = String::new();

        for attempt in 1..=max_attempts {
            debug!(
                schema = schema.name(),
                attempt, max_attempts, "Requesting generation"
            );
            let raw = self
                .complete_with_backoff(schema.name(), &request, &params, max_attempts)
                .await?;

            match parse_payload(schema, &raw) {
                Ok(output) => {
                    if attempt > 1 {
                        info!(
                            schema = schema.name(),
                            attempt, "Generated content accepted after correction"
                        );
                    }
                    return Ok(output);
                }
                Err(violation) => {
                    warn!(
                        schema = schema.name(),
                        attempt,
                        max_attempts,
                        violation = %violation,
                        "Generated content rejected"
                    );
                    debug!(schema = schema.name(), payload = %preview(&raw, 300), "Rejected payload");
                    if self.policy.tighten_on_retry {
                        request = prompts::with_correction(prompt, &violation.0);
                    }
                    last_violation = violation.0;
                    last_payload = raw;
                }
            }
        }

        Err(SchemaValidationError {
            schema: schema.name(),
            attempts: max_attempts,
            violation: last_violation,
            last_payload,
        }
        .into())
    }

    async fn complete_with_backoff(
        &self,
        schema: &'static str,
        prompt: &str,
        params: &CompletionParams,
        max_attempts: usize,
    ) -> Result<String, LlmInvocationError> {
        let mut last_cause = String::new();

        for attempt in 1..=max_attempts {
            match self.client.complete(prompt, params).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    last_cause = format!("{:#}", e);
                    if attempt == max_attempts {
                        break;
                    }
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        schema,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %last_cause,
                        "LLM call failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        warn!(schema, attempts = max_attempts, error = %last_cause, "LLM call failed permanently");
        Err(LlmInvocationError {
            attempts: max_attempts,
            last_cause,
        })
    }
}
