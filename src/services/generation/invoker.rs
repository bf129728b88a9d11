//! Model Invocation Adapter
//!
//! One bounded-duration call to the model provider per `invoke`. The
//! provider future is raced against a timer with `tokio::time::timeout`;
//! when the timer wins the future is dropped, which cancels the in-flight
//! request so a late response can never be observed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use cmdshift_llm::{LlmProvider, LlmRequestOptions, Message, StopReason};

use super::error::GenerationError;

/// Text returned by one model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCompletion {
    pub text: String,
    pub elapsed_ms: u64,
    pub stop_reason: StopReason,
}

impl RawCompletion {
    /// The provider reports it stopped at the output token ceiling.
    pub fn hit_token_limit(&self) -> bool {
        self.stop_reason == StopReason::MaxTokens
    }
}

/// Issues single, time-bounded calls through an [`LlmProvider`].
#[derive(Clone)]
pub struct ModelInvoker {
    provider: Arc<dyn LlmProvider>,
    temperature: f32,
}

impl ModelInvoker {
    pub fn new(provider: Arc<dyn LlmProvider>, temperature: f32) -> Self {
        Self {
            provider,
            temperature,
        }
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Send `prompt_text` as the system prompt and `user_prompt` as the user
    /// turn, failing with `Timeout` once `timeout` elapses.
    pub async fn invoke(
        &self,
        prompt_text: &str,
        user_prompt: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<RawCompletion, GenerationError> {
        let options = LlmRequestOptions {
            temperature_override: Some(self.temperature),
            max_tokens_override: Some(max_tokens),
        };
        let started = Instant::now();
        let call = self.provider.send_message(
            vec![Message::user(user_prompt)],
            Some(prompt_text.to_string()),
            options,
        );

        let response = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result.map_err(GenerationError::from)?,
            Err(_) => {
                warn!(
                    provider = self.provider.name(),
                    timeout_secs = timeout.as_secs_f64(),
                    "model call timed out"
                );
                return Err(GenerationError::Timeout { budget: timeout });
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let text = response.content.unwrap_or_default();
        debug!(
            model = %response.model,
            elapsed_ms,
            output_tokens = response.usage.output_tokens,
            stop_reason = ?response.stop_reason,
            "model call completed"
        );

        Ok(RawCompletion {
            text,
            elapsed_ms,
            stop_reason: response.stop_reason,
        })
    }
}
