//! Shared fixtures: a scripted model provider and in-memory app state.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use cmdshift_backend::models::settings::ServerConfig;
use cmdshift_backend::services::generation::{
    AttemptBudget, GenerationOrchestrator, RetryPolicy,
};
use cmdshift_backend::services::identity::JwtIdentity;
use cmdshift_backend::services::projects::SqliteProjectStore;
use cmdshift_backend::AppState;
use cmdshift_llm::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig,
    StopReason, UsageStats,
};

/// One scripted provider reply
pub struct Reply {
    pub delay: Duration,
    pub result: LlmResult<LlmResponse>,
}

impl Reply {
    pub fn text(content: &str) -> Self {
        Self::with_stop(content, StopReason::EndTurn)
    }

    pub fn truncated(content: &str) -> Self {
        Self::with_stop(content, StopReason::MaxTokens)
    }

    pub fn with_stop(content: &str, stop_reason: StopReason) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(LlmResponse {
                content: Some(content.to_string()),
                stop_reason,
                usage: UsageStats::default(),
                model: "scripted".to_string(),
            }),
        }
    }

    pub fn error(err: LlmError) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(err),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Provider that replays scripted replies in order
pub struct ScriptedProvider {
    config: ProviderConfig,
    replies: Mutex<Vec<Reply>>,
    calls: AtomicU32,
    system_prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            config: ProviderConfig {
                api_key: Some("test-key".to_string()),
                ..ProviderConfig::default()
            },
            replies: Mutex::new(replies),
            calls: AtomicU32::new(0),
            system_prompts: Mutex::new(Vec::new()),
        })
    }

    /// Provider without an API key
    pub fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            config: ProviderConfig::default(),
            replies: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
            system_prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn system_prompts(&self) -> Vec<String> {
        self.system_prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn send_message(
        &self,
        _messages: Vec<Message>,
        system: Option<String>,
        _request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.system_prompts
            .lock()
            .unwrap()
            .push(system.unwrap_or_default());

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                None
            } else {
                Some(replies.remove(0))
            }
        };
        match reply {
            Some(reply) => {
                tokio::time::sleep(reply.delay).await;
                reply.result
            }
            None => Err(LlmError::Other {
                message: "No more scripted replies".to_string(),
            }),
        }
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

/// Default policy with short real timeouts
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        initial: AttemptBudget {
            max_tokens: 6000,
            timeout: Duration::from_millis(300),
        },
        retry: AttemptBudget {
            max_tokens: 4000,
            timeout: Duration::from_millis(200),
        },
        ..RetryPolicy::default()
    }
}

pub fn orchestrator(provider: &Arc<ScriptedProvider>) -> GenerationOrchestrator {
    GenerationOrchestrator::new(provider.clone(), fast_policy())
}

/// Secret the fixture state verifies bearer tokens against
pub const JWT_SECRET: &str = "integration-test-secret";

/// Token verifier sharing the fixture secret
pub fn identity() -> JwtIdentity {
    JwtIdentity::new(JWT_SECRET).unwrap()
}

/// `Authorization` header value for `user`
pub fn bearer(user: &str) -> String {
    format!(
        "Bearer {}",
        identity().sign(&serde_json::json!({ "sub": user }))
    )
}

/// App state over `provider` and a fresh in-memory store
pub fn app_state(provider: &Arc<ScriptedProvider>, config: ServerConfig) -> Arc<AppState> {
    app_state_with_policy(provider, config, fast_policy())
}

pub fn app_state_with_policy(
    provider: &Arc<ScriptedProvider>,
    config: ServerConfig,
    policy: RetryPolicy,
) -> Arc<AppState> {
    Arc::new(AppState::new(
        config,
        GenerationOrchestrator::new(provider.clone(), policy),
        Arc::new(SqliteProjectStore::in_memory().unwrap()),
        Arc::new(identity()),
    ))
}
