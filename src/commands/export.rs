//! Export Command

use crate::models::project::{CodeSnapshot, ExportRequest};
use crate::server::http::{HttpRequest, HttpResponse};
use crate::services::projects::export_zip;
use crate::utils::error::AppResult;

/// `POST /api/export`: the snapshot as a zip attachment
pub fn export_project(request: &HttpRequest) -> AppResult<HttpResponse> {
    let body: ExportRequest = request.json()?;
    let snapshot = CodeSnapshot::from_parts(body.files, body.code)?;
    let archive = export_zip(&snapshot, body.name.as_deref())?;

    tracing::info!(
        file_name = %archive.file_name,
        bytes = archive.bytes.len(),
        "project exported"
    );
    Ok(HttpResponse::new(200)
        .with_header("Content-Type", "application/zip")
        .with_header(
            "Content-Disposition",
            &format!("attachment; filename=\"{}\"", archive.file_name),
        )
        .with_body(archive.bytes))
}
