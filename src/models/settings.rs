//! Settings Models
//!
//! Server configuration stored in config.json, plus the generation budget
//! and cache knobs the pipeline is built from.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use cmdshift_core::proxy::ProxyConfig;
use cmdshift_llm::{ProviderConfig, DEFAULT_MODEL};

/// Deployment environment. Error details are only exposed in development,
/// which must be selected explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    /// Parse an `APP_ENV` / `NODE_ENV` style value.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" => Some(Environment::Development),
            "production" | "prod" => Some(Environment::Production),
            _ => None,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Model provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Only ever supplied by the environment; never written back to disk.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// API root override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Outbound proxy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            proxy: None,
        }
    }
}

impl ProviderSettings {
    /// Build the provider configuration the LLM crate consumes.
    pub fn to_provider_config(&self, generation: &GenerationSettings) -> ProviderConfig {
        ProviderConfig {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            max_tokens: generation.initial_max_tokens,
            temperature: generation.temperature,
            proxy: self.proxy.clone(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Identity token verification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HS256 secret shared with the auth service. Only ever supplied by
    /// the environment; never written back to disk.
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
}

impl AuthSettings {
    pub fn has_jwt_secret(&self) -> bool {
        self.jwt_secret.as_deref().is_some_and(|s| !s.trim().is_empty())
    }
}

/// Retry and budget settings for the generation pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationSettings {
    /// Total model invocations allowed per request
    pub max_attempts: u32,
    /// Sampling temperature, same for every attempt
    pub temperature: f32,
    /// Output token ceiling for attempt 0
    pub initial_max_tokens: u32,
    /// Output token ceiling for later attempts
    pub retry_max_tokens: u32,
    /// Timeout for attempt 0
    pub initial_timeout_secs: u64,
    /// Timeout for later attempts
    pub retry_timeout_secs: u64,
    /// Outer deadline for a whole HTTP request
    pub request_deadline_secs: u64,
    /// Response length cap stated in the minimal prompt
    pub minimal_response_char_cap: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            temperature: 0.7,
            initial_max_tokens: 6000,
            retry_max_tokens: 4000,
            initial_timeout_secs: 45,
            retry_timeout_secs: 30,
            request_deadline_secs: 120,
            minimal_response_char_cap: 8000,
        }
    }
}

impl GenerationSettings {
    /// Worst-case time spent waiting on the model across all attempts.
    /// `None` when the sum does not fit in a `u64`.
    pub fn total_attempt_budget_secs(&self) -> Option<u64> {
        let retries = u64::from(self.max_attempts.saturating_sub(1));
        self.retry_timeout_secs
            .checked_mul(retries)?
            .checked_add(self.initial_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts < 1 {
            return Err("max_attempts must be at least 1".to_string());
        }
        if !(self.temperature > 0.0 && self.temperature <= 1.0) {
            return Err(format!(
                "Invalid temperature: {}. Must be in (0, 1]",
                self.temperature
            ));
        }
        if self.initial_max_tokens == 0 || self.retry_max_tokens == 0 {
            return Err("token budgets must be greater than 0".to_string());
        }
        if self.retry_max_tokens > self.initial_max_tokens {
            return Err("retry_max_tokens cannot exceed initial_max_tokens".to_string());
        }
        if self.initial_timeout_secs == 0 || self.retry_timeout_secs == 0 {
            return Err("attempt timeouts must be greater than 0".to_string());
        }
        if self.retry_timeout_secs > self.initial_timeout_secs {
            return Err("retry_timeout_secs cannot exceed initial_timeout_secs".to_string());
        }
        let total = self
            .total_attempt_budget_secs()
            .ok_or_else(|| "attempt timeouts overflow when summed".to_string())?;
        if total >= self.request_deadline_secs {
            return Err(format!(
                "attempt timeouts ({}s total) must stay below request_deadline_secs ({}s)",
                total, self.request_deadline_secs
            ));
        }
        if self.minimal_response_char_cap < 500 {
            return Err("minimal_response_char_cap must be at least 500".to_string());
        }
        Ok(())
    }
}

/// Generation cache settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub max_entries: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3600,
            max_entries: 100,
        }
    }
}

/// Server configuration stored in config.json
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Allowed CORS origin
    pub frontend_url: String,
    /// Deployment environment
    pub environment: Environment,
    /// Model provider
    pub provider: ProviderSettings,
    /// Generation pipeline budgets
    pub generation: GenerationSettings,
    /// Generation cache
    pub cache: CacheSettings,
    /// Project route authentication
    pub auth: AuthSettings,
    /// SQLite file; defaults to ~/.cmdshift/projects.db
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            frontend_url: "http://localhost:5173".to_string(),
            environment: Environment::Production,
            provider: ProviderSettings::default(),
            generation: GenerationSettings::default(),
            cache: CacheSettings::default(),
            auth: AuthSettings::default(),
            database_path: None,
        }
    }
}

impl ServerConfig {
    /// `host:port` string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Outer deadline applied to every HTTP request
    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.generation.request_deadline_secs)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("host cannot be empty".to_string());
        }
        if !(self.frontend_url.starts_with("http://") || self.frontend_url.starts_with("https://"))
        {
            return Err(format!(
                "Invalid frontend_url: {}. Must start with http:// or https://",
                self.frontend_url
            ));
        }
        if self.provider.model.trim().is_empty() {
            return Err("provider.model cannot be empty".to_string());
        }
        if let Some(proxy) = &self.provider.proxy {
            proxy.validate().map_err(String::from)?;
        }
        self.generation.validate()?;
        if self.cache.enabled && (self.cache.ttl_secs == 0 || self.cache.max_entries == 0) {
            return Err("cache ttl_secs and max_entries must be greater than 0".to_string());
        }
        Ok(())
    }
}
