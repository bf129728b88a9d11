//! JSON Configuration Management
//!
//! Handles reading and writing the server configuration file and layering
//! environment overrides on top of it.

use std::fs;
use std::path::{Path, PathBuf};

use cmdshift_core::proxy::ProxyConfig;

use crate::models::settings::{Environment, ServerConfig};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_parent_dir};

/// Overrides the config file location
pub const CONFIG_ENV_VAR: &str = "CMDSHIFT_CONFIG";

/// Configuration service for managing server settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: ServerConfig,
}

impl ConfigService {
    /// Load from `$CMDSHIFT_CONFIG` or ~/.cmdshift/config.json and apply
    /// process environment overrides.
    pub fn new() -> AppResult<Self> {
        let path = match std::env::var(CONFIG_ENV_VAR) {
            Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
            _ => config_path()?,
        };
        let mut service = Self::load(path)?;
        service.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(service)
    }

    /// Load configuration from `path`, writing defaults if the file is missing
    pub fn load(path: impl Into<PathBuf>) -> AppResult<Self> {
        let config_path = path.into();
        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let default_config = ServerConfig::default();
            ensure_parent_dir(&config_path)?;
            Self::save_to_file(&config_path, &default_config)?;
            default_config
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<ServerConfig> {
        let content = fs::read_to_string(path)?;
        let config: ServerConfig = serde_json::from_str(&content)?;
        config.validate().map_err(AppError::validation)?;
        Ok(config)
    }

    /// Save configuration to a file with pretty formatting
    fn save_to_file(path: &Path, config: &ServerConfig) -> AppResult<()> {
        config.validate().map_err(AppError::validation)?;
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// Blank values are ignored. The merged configuration is re-validated.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let config = &mut self.config;

        if let Some(key) = get("ANTHROPIC_API_KEY") {
            config.provider.api_key = Some(key);
        }
        if let Some(model) = get("ANTHROPIC_MODEL") {
            config.provider.model = model;
        }
        if let Some(base_url) = get("ANTHROPIC_BASE_URL") {
            config.provider.base_url = Some(base_url);
        }
        if let Some(port) = get("PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| AppError::config(format!("Invalid PORT: {}", port)))?;
        }
        if let Some(host) = get("HOST") {
            config.host = host;
        }
        if let Some(frontend_url) = get("FRONTEND_URL") {
            config.frontend_url = frontend_url;
        }
        if let Some(env) = get("APP_ENV").or_else(|| get("NODE_ENV")) {
            config.environment = Environment::parse(&env)
                .ok_or_else(|| AppError::config(format!("Invalid environment: {}", env)))?;
        }
        if let Some(db) = get("CMDSHIFT_DB") {
            config.database_path = Some(PathBuf::from(db));
        }
        if let Some(secret) = get("CMDSHIFT_JWT_SECRET").or_else(|| get("SUPABASE_JWT_SECRET")) {
            config.auth.jwt_secret = Some(secret);
        }
        if let Some(proxy) = get("CMDSHIFT_PROXY") {
            config.provider.proxy = Some(ProxyConfig::from_url(&proxy)?);
        }

        config.validate().map_err(AppError::validation)
    }

    /// Get the current configuration
    pub fn get_config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get a clone of the current configuration
    pub fn get_config_clone(&self) -> ServerConfig {
        self.config.clone()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Save the current configuration to disk
    pub fn save(&self) -> AppResult<()> {
        Self::save_to_file(&self.config_path, &self.config)
    }

    /// Reload configuration from disk, dropping environment overrides
    pub fn reload(&mut self) -> AppResult<()> {
        self.config = Self::load_from_file(&self.config_path)?;
        Ok(())
    }

    /// Check if the config service is healthy
    pub fn is_healthy(&self) -> bool {
        self.config_path.exists() && self.config.validate().is_ok()
    }
}
