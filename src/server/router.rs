//! Router
//!
//! Maps method and path onto handlers. Project routes resolve the caller
//! first and answer 401 without one.

use crate::commands;
use crate::models::response::ErrorBody;
use crate::server::http::{HttpRequest, HttpResponse};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProjectRoute<'a> {
    List,
    Save,
    Update(&'a str),
    Delete(&'a str),
    Versions(&'a str),
    Version(&'a str, &'a str),
    Restore(&'a str, &'a str),
    Diff(&'a str, &'a str, &'a str),
}

impl<'a> ProjectRoute<'a> {
    fn parse(method: &str, rest: &[&'a str]) -> Option<Self> {
        let route = match (method, rest) {
            ("GET", []) => ProjectRoute::List,
            ("POST", []) => ProjectRoute::Save,
            ("PUT", [id]) => ProjectRoute::Update(*id),
            ("DELETE", [id]) => ProjectRoute::Delete(*id),
            ("GET", [id, "versions"]) => ProjectRoute::Versions(*id),
            ("GET", [id, "versions", n]) => ProjectRoute::Version(*id, *n),
            ("POST", [id, "restore", n]) => ProjectRoute::Restore(*id, *n),
            ("GET", [id, "diff", from, to]) => ProjectRoute::Diff(*id, *from, *to),
            _ => return None,
        };
        Some(route)
    }
}

/// Route one request
pub async fn route(state: &AppState, request: &HttpRequest) -> HttpResponse {
    if request.method == "OPTIONS" {
        return HttpResponse::no_content();
    }

    let segments: Vec<&str> = request
        .path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    match (request.method.as_str(), segments.as_slice()) {
        ("GET", ["health"]) => commands::health(state),
        ("POST", ["api", "generate"]) => commands::generate(state, request).await,
        ("POST", ["api", "export"]) => respond(state, commands::export_project(request)),
        (method, ["api", "projects", rest @ ..]) => match ProjectRoute::parse(method, rest) {
            Some(project_route) => respond(state, dispatch_project(state, request, project_route)),
            None => not_found(request),
        },
        _ => not_found(request),
    }
}

fn dispatch_project(
    state: &AppState,
    request: &HttpRequest,
    route: ProjectRoute<'_>,
) -> AppResult<HttpResponse> {
    let user_id = state.authenticate(request)?;
    let user_id = user_id.as_str();

    match route {
        ProjectRoute::List => commands::list_projects(state, user_id),
        ProjectRoute::Save => commands::save_project(state, user_id, request),
        ProjectRoute::Update(id) => commands::update_project(state, user_id, id, request),
        ProjectRoute::Delete(id) => commands::delete_project(state, user_id, id),
        ProjectRoute::Versions(id) => commands::list_versions(state, user_id, id),
        ProjectRoute::Version(id, n) => {
            commands::get_version(state, user_id, id, parse_version(n)?)
        }
        ProjectRoute::Restore(id, n) => {
            commands::restore_version(state, user_id, id, parse_version(n)?)
        }
        ProjectRoute::Diff(id, from, to) => commands::diff_versions(
            state,
            user_id,
            id,
            parse_version(from)?,
            parse_version(to)?,
        ),
    }
}

/// Version numbers are 1-based
fn parse_version(raw: &str) -> AppResult<u32> {
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::validation(format!("Invalid version number: {}", raw))),
    }
}

fn respond(state: &AppState, result: AppResult<HttpResponse>) -> HttpResponse {
    match result {
        Ok(response) => response,
        Err(err) => {
            if err.status_code() >= 500 {
                tracing::error!(error = %err, "request failed");
            } else {
                tracing::debug!(error = %err, "request rejected");
            }
            HttpResponse::from_app_error(&err, state.include_error_details())
        }
    }
}

fn not_found(request: &HttpRequest) -> HttpResponse {
    HttpResponse::error(
        404,
        ErrorBody::new(
            "Not Found",
            format!("Cannot {} {}", request.method, request.path),
        ),
    )
}
