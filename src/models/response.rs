//! Response Types
//!
//! Standard JSON bodies shared by all HTTP handlers.

use serde::{Deserialize, Serialize};

/// Service name reported by the health endpoint
pub const SERVICE_NAME: &str = "cmdshift-backend";

/// Error body: `{ error, message, details? }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    /// Short category, e.g. "Request timeout"
    pub error: String,
    /// Generic, actionable message
    pub message: String,
    /// Internal detail, only attached in development
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Attach detail when `include` is set.
    pub fn with_details(mut self, details: impl Into<String>, include: bool) -> Self {
        if include {
            self.details = Some(details.into());
        }
        self
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub service: String,
    pub version: String,
    /// Whether a model API key is configured
    pub provider_configured: bool,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            provider_configured: false,
        }
    }
}

/// Plain `{ success: true }` acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
