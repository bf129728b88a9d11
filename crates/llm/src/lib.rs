//! CmdShift LLM
//!
//! Provider abstraction for the code generation pipeline:
//! - `LlmProvider` trait, the seam the generation orchestrator calls through
//! - Anthropic Messages API implementation
//! - Proxy-aware HTTP client factory
//!
//! Providers here perform exactly one request per call. Retry, timeout and
//! recovery policy belong to the caller.

pub mod anthropic;
pub mod http_client;
pub mod provider;
pub mod types;

// Re-export main types
pub use anthropic::AnthropicProvider;
pub use http_client::build_http_client;
pub use provider::LlmProvider;
pub use types::*;
