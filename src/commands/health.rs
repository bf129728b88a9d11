//! Health Check

use crate::models::response::HealthResponse;
use crate::server::http::HttpResponse;
use crate::state::AppState;

/// `GET /health`
pub fn health(state: &AppState) -> HttpResponse {
    let health = HealthResponse {
        provider_configured: state.orchestrator().is_configured(),
        ..HealthResponse::default()
    };
    HttpResponse::ok(&health)
}
