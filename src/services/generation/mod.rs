//! Generation Service
//!
//! The response-recovery pipeline that turns a user prompt into a
//! multi-file web project:
//! - Tiered prompt construction (full, simplified, minimal)
//! - Time-bounded model invocation
//! - Structural scan and repair of truncated JSON
//! - Retry state machine with per-attempt budgets
//! - Single-file fallback normalization
//! - Prompt-keyed result cache

pub mod cache;
pub mod error;
pub mod invoker;
pub mod normalize;
pub mod orchestrator;
pub mod plan;
pub mod prompts;

pub use cache::{cache_key, normalize_prompt, GenerationCache, MokaGenerationCache};
pub use error::GenerationError;
pub use invoker::{ModelInvoker, RawCompletion};
pub use normalize::{
    extract_project_files, looks_like_legacy_source, normalize_legacy_source, strip_code_fences,
    CanonicalResult, LEGACY_FRAMEWORK, LEGACY_LANGUAGE,
};
pub use orchestrator::{interpret_completion, GenerationOrchestrator, EMPTY_PROMPT_MESSAGE};
pub use plan::{
    AttemptBudget, AttemptPlan, AttemptState, AttemptVerdict, GenerationOutcome, GenerationState,
    RetryPolicy,
};
pub use prompts::{GenerationRequest, PromptBuilder, PromptTier};
