//! Zip Export
//!
//! Packages a snapshot as an in-memory zip archive for download.

use std::io::{Cursor, Write};
use std::path::{Component, Path};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::models::project::CodeSnapshot;
use crate::utils::error::{AppError, AppResult};

/// Archive name used when none is supplied
pub const DEFAULT_EXPORT_NAME: &str = "cmdshift-project";

/// A built archive and the file name it should be served under
#[derive(Debug, Clone)]
pub struct ExportArchive {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Build a deflated zip with one entry per file.
///
/// Entry paths must be relative and free of `..` components.
pub fn export_zip(snapshot: &CodeSnapshot, project_name: Option<&str>) -> AppResult<ExportArchive> {
    let files = snapshot.as_file_map();
    for path in files.keys() {
        validate_entry_path(path)?;
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for (path, content) in &files {
        writer.start_file(path.as_str(), options)?;
        writer.write_all(content.as_bytes())?;
    }

    let bytes = writer.finish()?.into_inner();
    Ok(ExportArchive {
        file_name: export_file_name(project_name),
        bytes,
    })
}

/// `Content-Disposition` file name for an export: `name` reduced to
/// `[A-Za-z0-9._-]` with a `.zip` suffix.
pub fn export_file_name(name: Option<&str>) -> String {
    let cleaned: String = name
        .unwrap_or("")
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '-' || c == '.');
    let stem = if cleaned.is_empty() {
        DEFAULT_EXPORT_NAME
    } else {
        cleaned
    };
    format!("{}.zip", stem.trim_end_matches(".zip"))
}

fn validate_entry_path(path: &str) -> AppResult<()> {
    if path.trim().is_empty() || path.contains('\\') {
        return Err(AppError::validation(format!("Invalid file path: {:?}", path)));
    }
    let ok = Path::new(path)
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
    if !ok {
        return Err(AppError::validation(format!("Invalid file path: {:?}", path)));
    }
    Ok(())
}
