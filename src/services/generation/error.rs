//! Generation Errors
//!
//! Failure taxonomy of the generation pipeline, with the HTTP status,
//! category and caller-facing message each one surfaces as.

use std::time::Duration;

use thiserror::Error;

use cmdshift_llm::LlmError;

/// Errors produced by the generation pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// Missing or empty prompt
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The server is missing provider credentials
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Provider rejected the credentials (401/403)
    #[error("Upstream authentication failed: {0}")]
    UpstreamAuth(String),

    /// Provider quota exceeded (429)
    #[error("Upstream rate limit: {message}")]
    UpstreamRateLimit {
        message: String,
        retry_after: Option<u32>,
    },

    /// Provider rejected the request body (400/413)
    #[error("Upstream rejected request: {0}")]
    UpstreamBadRequest(String),

    /// Any other provider or network failure
    #[error("Upstream error{}: {message}", status_suffix(.status))]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    /// An attempt exceeded its time budget
    #[error("Model call exceeded its {}s budget", .budget.as_secs())]
    Timeout { budget: Duration },

    /// Completion was not a usable JSON project and could not be repaired
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// Unexpected failure inside the pipeline
    #[error("Internal error: {0}")]
    Internal(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

impl GenerationError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the orchestrator may spend another attempt on this failure.
    ///
    /// Auth, quota and timeout failures cross a trust or budget boundary and
    /// are surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::MalformedResponse(_)
                | GenerationError::Upstream { .. }
                | GenerationError::UpstreamBadRequest(_)
        )
    }

    /// HTTP status code the transport answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            GenerationError::InvalidInput(_) | GenerationError::UpstreamBadRequest(_) => 400,
            GenerationError::UpstreamAuth(_) => 401,
            GenerationError::UpstreamRateLimit { .. } => 429,
            GenerationError::Timeout { .. } => 504,
            GenerationError::Configuration(_)
            | GenerationError::Upstream { .. }
            | GenerationError::MalformedResponse(_)
            | GenerationError::Internal(_) => 500,
        }
    }

    /// The `error` field of the response body.
    pub fn category(&self) -> &'static str {
        match self {
            GenerationError::InvalidInput(_) | GenerationError::UpstreamBadRequest(_) => {
                "Invalid request"
            }
            GenerationError::Configuration(_) => "Configuration error",
            GenerationError::UpstreamAuth(_) => "Authentication error",
            GenerationError::UpstreamRateLimit { .. } => "Rate limit exceeded",
            GenerationError::Timeout { .. } => "Request timeout",
            GenerationError::Upstream { .. } | GenerationError::MalformedResponse(_) => {
                "AI service error"
            }
            GenerationError::Internal(_) => "Internal server error",
        }
    }

    /// Generic, actionable message that leaks no provider detail.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::InvalidInput(msg) => msg.clone(),
            GenerationError::Configuration(_) => {
                "AI service is not properly configured. Please check server settings.".to_string()
            }
            GenerationError::UpstreamAuth(_) => {
                "Invalid API key. Please check your configuration.".to_string()
            }
            GenerationError::UpstreamRateLimit { .. } => {
                "Too many requests. Please try again later.".to_string()
            }
            GenerationError::UpstreamBadRequest(_) => {
                "The prompt may be too long or contain invalid characters.".to_string()
            }
            GenerationError::Timeout { .. } => {
                "The request took too long to process. Please try with a simpler prompt."
                    .to_string()
            }
            GenerationError::Upstream { .. }
            | GenerationError::MalformedResponse(_)
            | GenerationError::Internal(_) => "Failed to generate code. Please try again.".to_string(),
        }
    }
}

impl From<LlmError> for GenerationError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::AuthenticationFailed { message } => GenerationError::UpstreamAuth(message),
            LlmError::RateLimited {
                message,
                retry_after,
            } => GenerationError::UpstreamRateLimit {
                message,
                retry_after,
            },
            LlmError::InvalidRequest { message }
            | LlmError::ContextLengthExceeded { message, .. } => {
                GenerationError::UpstreamBadRequest(message)
            }
            LlmError::ServerError { message, status } => {
                GenerationError::Upstream { status, message }
            }
            other => GenerationError::Upstream {
                status: None,
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(GenerationError::invalid_input("x").status_code(), 400);
        assert_eq!(GenerationError::UpstreamAuth("x".into()).status_code(), 401);
        assert_eq!(
            GenerationError::UpstreamRateLimit {
                message: "x".into(),
                retry_after: None
            }
            .status_code(),
            429
        );
        assert_eq!(
            GenerationError::UpstreamBadRequest("x".into()).status_code(),
            400
        );
        assert_eq!(
            GenerationError::Timeout {
                budget: Duration::from_secs(45)
            }
            .status_code(),
            504
        );
        assert_eq!(GenerationError::malformed("x").status_code(), 500);
        assert_eq!(GenerationError::internal("x").status_code(), 500);
        assert_eq!(GenerationError::Configuration("x".into()).status_code(), 500);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(GenerationError::malformed("x").is_retryable());
        assert!(GenerationError::Upstream {
            status: Some(503),
            message: "x".into()
        }
        .is_retryable());
        assert!(GenerationError::UpstreamBadRequest("x".into()).is_retryable());

        assert!(!GenerationError::invalid_input("x").is_retryable());
        assert!(!GenerationError::UpstreamAuth("x".into()).is_retryable());
        assert!(!GenerationError::UpstreamRateLimit {
            message: "x".into(),
            retry_after: Some(5)
        }
        .is_retryable());
        assert!(!GenerationError::Timeout {
            budget: Duration::from_secs(1)
        }
        .is_retryable());
        assert!(!GenerationError::internal("x").is_retryable());
    }

    #[test]
    fn test_llm_error_mapping() {
        let err: GenerationError = LlmError::AuthenticationFailed {
            message: "bad key".into(),
        }
        .into();
        assert!(matches!(err, GenerationError::UpstreamAuth(_)));

        let err: GenerationError = LlmError::RateLimited {
            message: "slow".into(),
            retry_after: Some(9),
        }
        .into();
        assert_eq!(
            err,
            GenerationError::UpstreamRateLimit {
                message: "slow".into(),
                retry_after: Some(9)
            }
        );

        let err: GenerationError = LlmError::ContextLengthExceeded {
            message: "too long".into(),
            max_tokens: None,
        }
        .into();
        assert!(matches!(err, GenerationError::UpstreamBadRequest(_)));

        let err: GenerationError = LlmError::ServerError {
            message: "overloaded".into(),
            status: Some(529),
        }
        .into();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_string(), "Upstream error (529): overloaded");

        let err: GenerationError = LlmError::NetworkError {
            message: "reset".into(),
        }
        .into();
        assert!(matches!(err, GenerationError::Upstream { status: None, .. }));
    }

    #[test]
    fn test_user_messages_hide_provider_detail() {
        let err = GenerationError::Upstream {
            status: Some(500),
            message: "internal trace id abc123".into(),
        };
        assert!(!err.user_message().contains("abc123"));
        assert_eq!(
            GenerationError::Timeout {
                budget: Duration::from_secs(45)
            }
            .category(),
            "Request timeout"
        );
    }
}
