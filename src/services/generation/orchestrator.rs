//! Generation Orchestrator
//!
//! Drives the retry state machine in [`super::plan`]: builds the prompt for
//! each attempt, invokes the model, scans/repairs/parses the completion and
//! lets the policy decide whether to stop, retry or fail. Attempts run
//! strictly one after another since each prompt depends on the previous
//! outcome.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use cmdshift_core::{repair, scan};
use cmdshift_llm::LlmProvider;

use super::cache::{cache_key, GenerationCache};
use super::error::GenerationError;
use super::invoker::{ModelInvoker, RawCompletion};
use super::normalize::{
    extract_project_files, looks_like_legacy_source, normalize_legacy_source, strip_code_fences,
};
use super::plan::{AttemptState, AttemptVerdict, GenerationOutcome, GenerationState, RetryPolicy};
use super::prompts::{GenerationRequest, PromptBuilder};

/// Message returned for a missing or blank prompt.
pub const EMPTY_PROMPT_MESSAGE: &str = "Prompt is required and must be a non-empty string";

/// Characters of the user prompt included in log lines.
const PROMPT_PREVIEW_CHARS: usize = 100;

/// Turns a user prompt into a canonical generation result.
pub struct GenerationOrchestrator {
    invoker: ModelInvoker,
    policy: RetryPolicy,
    prompts: PromptBuilder,
    cache: Option<Arc<dyn GenerationCache>>,
}

impl GenerationOrchestrator {
    pub fn new(provider: Arc<dyn LlmProvider>, policy: RetryPolicy) -> Self {
        Self {
            invoker: ModelInvoker::new(provider, policy.temperature),
            prompts: PromptBuilder::new(policy.minimal_response_char_cap),
            policy,
            cache: None,
        }
    }

    /// Serve repeated prompts from `cache`.
    pub fn with_cache(mut self, cache: Arc<dyn GenerationCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Whether the underlying provider has credentials.
    pub fn is_configured(&self) -> bool {
        self.invoker.provider().is_configured()
    }

    /// Run the pipeline for one request.
    pub async fn generate(&self, user_prompt: &str) -> Result<GenerationOutcome, GenerationError> {
        if user_prompt.trim().is_empty() {
            return Err(GenerationError::invalid_input(EMPTY_PROMPT_MESSAGE));
        }

        let started = Instant::now();
        info!(
            prompt = %prompt_preview(user_prompt),
            model = self.invoker.provider().model(),
            "generation started"
        );

        let key = self
            .cache
            .as_ref()
            .map(|_| cache_key(self.invoker.provider().model(), user_prompt));
        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(hit) = cache.get(key) {
                info!("generation served from cache");
                return Ok(hit.cached());
            }
        }

        let mut state = GenerationState::Idle;
        loop {
            state = match state {
                GenerationState::Idle => GenerationState::Attempting(AttemptState::initial()),
                GenerationState::Attempting(attempt) => {
                    self.run_attempt(user_prompt, &attempt).await
                }
                GenerationState::Retrying(next) => {
                    info!(
                        next_attempt = next.attempt_index + 1,
                        truncation_suspected = next.had_truncation_last_attempt,
                        reason = %next
                            .last_error
                            .as_ref()
                            .map(ToString::to_string)
                            .unwrap_or_default(),
                        "retrying generation"
                    );
                    GenerationState::Attempting(next)
                }
                GenerationState::Succeeded(outcome) => {
                    info!(
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        invocations = outcome.invocations,
                        is_project = outcome.result.is_project(),
                        partial = outcome.partial,
                        "generation completed"
                    );
                    if let (Some(cache), Some(key)) = (&self.cache, key) {
                        if !outcome.partial {
                            cache.insert(key, outcome.clone());
                        }
                    }
                    return Ok(outcome);
                }
                GenerationState::FailedTerminal(err) => {
                    error!(
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        category = err.category(),
                        status = err.status_code(),
                        error = %err,
                        "generation failed"
                    );
                    return Err(err);
                }
            };
        }
    }

    async fn run_attempt(&self, user_prompt: &str, attempt: &AttemptState) -> GenerationState {
        let plan = self.policy.plan(attempt);
        let request = GenerationRequest::new(
            user_prompt,
            attempt.attempt_index,
            attempt.had_truncation_last_attempt,
        );
        let prompt_text = self.prompts.build_for(&request);

        info!(
            attempt = plan.attempt_index + 1,
            max_attempts = self.policy.max_attempts,
            tier = %plan.tier,
            max_tokens = plan.budget.max_tokens,
            timeout_secs = plan.budget.timeout.as_secs_f64(),
            "starting generation attempt"
        );

        match self
            .invoker
            .invoke(
                &prompt_text,
                &request.user_prompt,
                plan.budget.max_tokens,
                plan.budget.timeout,
            )
            .await
        {
            Ok(completion) => {
                info!(
                    attempt = plan.attempt_index + 1,
                    response_chars = completion.text.chars().count(),
                    elapsed_ms = completion.elapsed_ms,
                    "model response received"
                );
                let verdict = interpret_completion(attempt.attempt_index, &completion);
                self.policy.after_verdict(attempt, verdict)
            }
            Err(err) => {
                warn!(
                    attempt = plan.attempt_index + 1,
                    retryable = err.is_retryable(),
                    error = %err,
                    "model call failed"
                );
                self.policy.after_error(attempt, err)
            }
        }
    }
}

/// Classify one completion: fence strip, scan, repair if truncated, parse,
/// then fall back to legacy single-file source on attempt 0.
pub fn interpret_completion(attempt_index: u32, completion: &RawCompletion) -> AttemptVerdict {
    let cleaned = strip_code_fences(&completion.text);
    let scan_result = scan(cleaned);

    if scan_result.went_negative {
        warn!(
            open_braces = scan_result.open_braces,
            open_brackets = scan_result.open_brackets,
            "response contains unmatched closing tokens"
        );
    }

    let truncated = scan_result.is_truncated() || completion.hit_token_limit();
    let (candidate, repairs) = if scan_result.is_truncated() {
        let outcome = repair(cleaned);
        warn!(
            open_braces = scan_result.open_braces,
            open_brackets = scan_result.open_brackets,
            in_string = scan_result.in_string,
            repairs = ?outcome.labels(),
            "response appears truncated, applied structural repair"
        );
        (Cow::Owned(outcome.repaired_text), outcome.applied_repairs)
    } else {
        (Cow::Borrowed(cleaned), Vec::new())
    };

    let reason = match serde_json::from_str::<Value>(&candidate) {
        Ok(value) => match extract_project_files(value) {
            Ok(files) => {
                debug!(files = files.len(), "parsed multi-file project");
                return AttemptVerdict::Project { files, repairs };
            }
            Err(reason) => reason,
        },
        Err(e) => format!("response is not valid JSON: {}", e),
    };

    if attempt_index == 0 && looks_like_legacy_source(cleaned) {
        info!("response is legacy single-file source, using single-file fallback");
        return AttemptVerdict::SingleFile {
            code: normalize_legacy_source(cleaned),
        };
    }

    debug!(truncated, reason = %reason, "response rejected");
    AttemptVerdict::Malformed { truncated, reason }
}

fn prompt_preview(prompt: &str) -> String {
    let preview: String = prompt.chars().take(PROMPT_PREVIEW_CHARS).collect();
    if prompt.chars().count() > PROMPT_PREVIEW_CHARS {
        format!("{}...", preview)
    } else {
        preview
    }
}
