//! Application State
//!
//! Shared state handed to every request handler: configuration, the
//! generation pipeline, the project store and the identity resolver.

use std::sync::Arc;
use std::time::Duration;

use cmdshift_llm::AnthropicProvider;

use crate::models::settings::ServerConfig;
use crate::server::http::HttpRequest;
use crate::services::generation::{GenerationOrchestrator, MokaGenerationCache, RetryPolicy};
use crate::services::identity::{DisabledIdentity, IdentityProvider, JwtIdentity, UserId};
use crate::services::projects::{ProjectStore, SqliteProjectStore};
use crate::storage::Database;
use crate::utils::error::{AppError, AppResult};

/// Application state shared across connections
pub struct AppState {
    config: ServerConfig,
    orchestrator: GenerationOrchestrator,
    store: Arc<dyn ProjectStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        orchestrator: GenerationOrchestrator,
        store: Arc<dyn ProjectStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            config,
            orchestrator,
            store,
            identity,
        }
    }

    /// Wire the production services from configuration
    pub fn from_config(config: ServerConfig) -> AppResult<Self> {
        let provider = AnthropicProvider::new(config.provider.to_provider_config(&config.generation))
            .map_err(|e| AppError::config(e.to_string()))?;

        let mut orchestrator = GenerationOrchestrator::new(
            Arc::new(provider),
            RetryPolicy::from_settings(&config.generation),
        );
        if config.cache.enabled {
            orchestrator = orchestrator.with_cache(Arc::new(MokaGenerationCache::new(
                Duration::from_secs(config.cache.ttl_secs),
                config.cache.max_entries,
            )));
        }

        let database = match &config.database_path {
            Some(path) => Database::open(path)?,
            None => Database::new()?,
        };

        if !config.provider.has_api_key() {
            tracing::warn!("ANTHROPIC_API_KEY is not set, generation requests will fail");
        }

        let identity: Arc<dyn IdentityProvider> = match &config.auth.jwt_secret {
            Some(secret) if config.auth.has_jwt_secret() => Arc::new(JwtIdentity::new(secret)?),
            _ => {
                tracing::warn!("CMDSHIFT_JWT_SECRET is not set, project routes will reject every caller");
                Arc::new(DisabledIdentity)
            }
        };

        Ok(Self::new(
            config,
            orchestrator,
            Arc::new(SqliteProjectStore::new(database)),
            identity,
        ))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &GenerationOrchestrator {
        &self.orchestrator
    }

    pub fn store(&self) -> &dyn ProjectStore {
        self.store.as_ref()
    }

    /// Error detail is attached to responses only in development
    pub fn include_error_details(&self) -> bool {
        self.config.environment.is_development()
    }

    /// Resolve the caller or fail with `Unauthorized`
    pub fn authenticate(&self, request: &HttpRequest) -> AppResult<UserId> {
        self.identity
            .identify(request.header("authorization"))
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}
