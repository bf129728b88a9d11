//! Attempt Plan
//!
//! The retry state machine as plain data. Every decision the orchestrator
//! makes (which prompt tier, which token budget, which timeout, retry or
//! stop) is a pure function here, so the decision table is testable
//! without any I/O.
//!
//! ```text
//! Idle -> Attempting(0) -> Succeeded
//!                       -> Retrying(1) -> Attempting(1) -> ...
//!                       -> FailedTerminal
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use cmdshift_core::RepairKind;

use super::error::GenerationError;
use super::normalize::CanonicalResult;
use super::prompts::PromptTier;
use crate::models::settings::GenerationSettings;

/// Token ceiling and timeout for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptBudget {
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// Orchestrator-internal per-iteration state.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptState {
    pub attempt_index: u32,
    pub had_truncation_last_attempt: bool,
    pub last_error: Option<GenerationError>,
}

impl AttemptState {
    pub fn initial() -> Self {
        Self {
            attempt_index: 0,
            had_truncation_last_attempt: false,
            last_error: None,
        }
    }

    fn next(&self, truncated: bool, error: GenerationError) -> Self {
        Self {
            attempt_index: self.attempt_index + 1,
            had_truncation_last_attempt: truncated,
            last_error: Some(error),
        }
    }
}

/// Everything needed to run one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptPlan {
    pub attempt_index: u32,
    pub tier: PromptTier,
    pub budget: AttemptBudget,
}

/// What an attempt's completion turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptVerdict {
    /// Parsed (possibly after repair) into a file map
    Project {
        files: BTreeMap<String, String>,
        repairs: Vec<RepairKind>,
    },
    /// Attempt 0 produced legacy single-file source
    SingleFile { code: String },
    /// Not usable; `truncated` feeds the next attempt's tier
    Malformed { truncated: bool, reason: String },
}

/// Result of a successful generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    pub result: CanonicalResult,
    /// A structural repair was needed
    pub partial: bool,
    pub repairs: Vec<RepairKind>,
    /// Model invocations spent; zero for cache hits
    pub invocations: u32,
    pub from_cache: bool,
}

impl GenerationOutcome {
    /// Human-readable repair labels, in application order.
    pub fn repair_labels(&self) -> Vec<String> {
        self.repairs.iter().map(ToString::to_string).collect()
    }

    /// The same outcome as served from cache.
    pub fn cached(&self) -> Self {
        Self {
            invocations: 0,
            from_cache: true,
            ..self.clone()
        }
    }
}

/// Orchestrator state. Each variant carries what the next step needs.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationState {
    Idle,
    Attempting(AttemptState),
    /// Carries the state of the attempt about to start
    Retrying(AttemptState),
    Succeeded(GenerationOutcome),
    FailedTerminal(GenerationError),
}

/// Attempt count, per-attempt budgets and temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial: AttemptBudget,
    pub retry: AttemptBudget,
    pub temperature: f32,
    pub minimal_response_char_cap: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&GenerationSettings::default())
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &GenerationSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            initial: AttemptBudget {
                max_tokens: settings.initial_max_tokens,
                timeout: Duration::from_secs(settings.initial_timeout_secs),
            },
            retry: AttemptBudget {
                max_tokens: settings.retry_max_tokens,
                timeout: Duration::from_secs(settings.retry_timeout_secs),
            },
            temperature: settings.temperature,
            minimal_response_char_cap: settings.minimal_response_char_cap,
        }
    }

    /// Attempt 0 gets the larger budget; every later attempt the smaller one.
    pub fn budget_for(&self, attempt_index: u32) -> AttemptBudget {
        if attempt_index == 0 {
            self.initial
        } else {
            self.retry
        }
    }

    pub fn plan(&self, attempt: &AttemptState) -> AttemptPlan {
        AttemptPlan {
            attempt_index: attempt.attempt_index,
            tier: PromptTier::select(attempt.attempt_index, attempt.had_truncation_last_attempt),
            budget: self.budget_for(attempt.attempt_index),
        }
    }

    /// Transition after the model answered.
    pub fn after_verdict(&self, attempt: &AttemptState, verdict: AttemptVerdict) -> GenerationState {
        let invocations = attempt.attempt_index + 1;
        match verdict {
            AttemptVerdict::Project { files, repairs } => {
                GenerationState::Succeeded(GenerationOutcome {
                    result: CanonicalResult::Project { files },
                    partial: !repairs.is_empty(),
                    repairs,
                    invocations,
                    from_cache: false,
                })
            }
            AttemptVerdict::SingleFile { code } => GenerationState::Succeeded(GenerationOutcome {
                result: CanonicalResult::single_file(code),
                partial: false,
                repairs: Vec::new(),
                invocations,
                from_cache: false,
            }),
            AttemptVerdict::Malformed { truncated, reason } => {
                self.retry_or_fail(attempt, truncated, GenerationError::MalformedResponse(reason))
            }
        }
    }

    /// Transition after the call itself failed. Transport failures carry
    /// no truncation evidence.
    pub fn after_error(&self, attempt: &AttemptState, error: GenerationError) -> GenerationState {
        if !error.is_retryable() {
            return GenerationState::FailedTerminal(error);
        }
        self.retry_or_fail(attempt, false, error)
    }

    fn retry_or_fail(
        &self,
        attempt: &AttemptState,
        truncated: bool,
        error: GenerationError,
    ) -> GenerationState {
        if attempt.attempt_index + 1 < self.max_attempts {
            GenerationState::Retrying(attempt.next(truncated, error))
        } else {
            GenerationState::FailedTerminal(error)
        }
    }
}
