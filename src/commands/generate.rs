//! Generate Command
//!
//! `POST /api/generate`: validates the prompt, runs the generation
//! pipeline and maps its outcome or error onto the wire.

use crate::models::generation::{GenerateRequest, GenerateResponse};
use crate::models::response::ErrorBody;
use crate::server::http::{HttpRequest, HttpResponse};
use crate::services::generation::{
    CanonicalResult, GenerationError, GenerationOutcome, EMPTY_PROMPT_MESSAGE,
};
use crate::state::AppState;

/// Handle a generation request
pub async fn generate(state: &AppState, request: &HttpRequest) -> HttpResponse {
    let include_details = state.include_error_details();

    let body: GenerateRequest = match request.json() {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(error = %e, "rejected generate body");
            return generation_error_response(
                &GenerationError::invalid_input("Request body must be valid JSON"),
                include_details,
            );
        }
    };
    let Some(prompt) = body.prompt_text() else {
        return generation_error_response(
            &GenerationError::invalid_input(EMPTY_PROMPT_MESSAGE),
            include_details,
        );
    };

    if !state.orchestrator().is_configured() {
        tracing::error!("generation requested without a configured API key");
        return generation_error_response(
            &GenerationError::Configuration("ANTHROPIC_API_KEY is not set".to_string()),
            include_details,
        );
    }

    match state.orchestrator().generate(prompt).await {
        Ok(outcome) => HttpResponse::ok(&outcome_response(outcome)),
        Err(err) => generation_error_response(&err, include_details),
    }
}

/// Success body for an outcome
pub fn outcome_response(outcome: GenerationOutcome) -> GenerateResponse {
    let repairs = outcome.repair_labels();
    match outcome.result {
        CanonicalResult::Project { files } => {
            GenerateResponse::project(files, outcome.partial, repairs)
        }
        CanonicalResult::SingleFile {
            code,
            language,
            framework,
        } => GenerateResponse::single_file(code, language, framework),
    }
}

/// `{ error, message, details? }` with the error's status code
pub fn generation_error_response(err: &GenerationError, include_details: bool) -> HttpResponse {
    let body = ErrorBody::new(err.category(), err.user_message())
        .with_details(err.to_string(), include_details);
    let response = HttpResponse::error(err.status_code(), body);
    match err {
        GenerationError::UpstreamRateLimit {
            retry_after: Some(secs),
            ..
        } => response.with_header("Retry-After", &secs.to_string()),
        _ => response,
    }
}
