//! Project Commands
//!
//! Saved projects and their version history. Every handler runs for an
//! already authenticated user.

use crate::models::project::{
    CodeSnapshot, DiffResponse, NewProject, ProjectListResponse, ProjectResponse, RestoreResponse,
    SaveProjectRequest, UpdateProjectRequest, VersionListResponse, VersionResponse,
};
use crate::models::response::SuccessResponse;
use crate::server::http::{HttpRequest, HttpResponse};
use crate::services::projects::diff_snapshots;
use crate::state::AppState;
use crate::utils::error::AppResult;

/// `GET /api/projects`
pub fn list_projects(state: &AppState, user_id: &str) -> AppResult<HttpResponse> {
    let projects = state.store().list(user_id)?;
    Ok(HttpResponse::ok(&ProjectListResponse { projects }))
}

/// `POST /api/projects`
pub fn save_project(state: &AppState, user_id: &str, request: &HttpRequest) -> AppResult<HttpResponse> {
    let body: SaveProjectRequest = request.json()?;
    let snapshot = CodeSnapshot::from_parts(body.files, body.code)?;
    let project = state.store().save(NewProject {
        user_id: user_id.to_string(),
        prompt: body.prompt,
        name: body.name,
        snapshot,
    })?;
    Ok(HttpResponse::json(201, &ProjectResponse { project }))
}

/// `PUT /api/projects/{id}`
pub fn update_project(
    state: &AppState,
    user_id: &str,
    project_id: &str,
    request: &HttpRequest,
) -> AppResult<HttpResponse> {
    let body: UpdateProjectRequest = request.json()?;
    let snapshot = CodeSnapshot::from_parts(body.files, body.code)?;
    let version = state
        .store()
        .append_version(project_id, user_id, snapshot, body.note)?;
    Ok(HttpResponse::ok(&VersionResponse { version }))
}

/// `DELETE /api/projects/{id}`
pub fn delete_project(state: &AppState, user_id: &str, project_id: &str) -> AppResult<HttpResponse> {
    state.store().delete(project_id, user_id)?;
    Ok(HttpResponse::ok(&SuccessResponse::ok()))
}

/// `GET /api/projects/{id}/versions`
pub fn list_versions(state: &AppState, user_id: &str, project_id: &str) -> AppResult<HttpResponse> {
    let project = state.store().get(project_id, user_id)?;
    let versions = state.store().list_versions(project_id, user_id)?;
    Ok(HttpResponse::ok(&VersionListResponse {
        versions,
        current_version: project.current_version,
    }))
}

/// `GET /api/projects/{id}/versions/{n}`
pub fn get_version(
    state: &AppState,
    user_id: &str,
    project_id: &str,
    version_number: u32,
) -> AppResult<HttpResponse> {
    let version = state.store().get_version(project_id, user_id, version_number)?;
    Ok(HttpResponse::ok(&VersionResponse { version }))
}

/// `POST /api/projects/{id}/restore/{n}`
pub fn restore_version(
    state: &AppState,
    user_id: &str,
    project_id: &str,
    version_number: u32,
) -> AppResult<HttpResponse> {
    let version = state.store().restore(project_id, user_id, version_number)?;
    Ok(HttpResponse::ok(&RestoreResponse {
        restored_code: version.code_snapshot.clone(),
        version,
    }))
}

/// `GET /api/projects/{id}/diff/{from}/{to}`
pub fn diff_versions(
    state: &AppState,
    user_id: &str,
    project_id: &str,
    from: u32,
    to: u32,
) -> AppResult<HttpResponse> {
    let old = state.store().get_version(project_id, user_id, from)?;
    let new = state.store().get_version(project_id, user_id, to)?;
    Ok(HttpResponse::ok(&DiffResponse {
        from,
        to,
        files: diff_snapshots(&old.code_snapshot, &new.code_snapshot),
    }))
}
