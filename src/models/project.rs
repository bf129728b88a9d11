//! Project Models
//!
//! Saved generation results and their version history.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::utils::error::{AppError, AppResult};

/// Longest prompt prefix used as a derived project name
const PROJECT_NAME_CHARS: usize = 30;

/// Shape of a saved project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectType {
    MultiFile,
    SingleFile,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::MultiFile => "multi-file",
            ProjectType::SingleFile => "single-file",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "multi-file" => Some(ProjectType::MultiFile),
            "single-file" => Some(ProjectType::SingleFile),
            _ => None,
        }
    }
}

/// Code payload of one version: a file map or a single legacy source string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodeSnapshot {
    Files(BTreeMap<String, String>),
    Code(String),
}

impl CodeSnapshot {
    /// Build a snapshot from request fields; exactly one must be present and non-empty.
    pub fn from_parts(
        files: Option<BTreeMap<String, String>>,
        code: Option<String>,
    ) -> AppResult<Self> {
        match (files, code) {
            (Some(files), None) if !files.is_empty() => Ok(CodeSnapshot::Files(files)),
            (None, Some(code)) if !code.trim().is_empty() => Ok(CodeSnapshot::Code(code)),
            (Some(_), Some(_)) => Err(AppError::validation(
                "Provide either files or code, not both",
            )),
            _ => Err(AppError::validation("files or code is required")),
        }
    }

    pub fn project_type(&self) -> ProjectType {
        match self {
            CodeSnapshot::Files(_) => ProjectType::MultiFile,
            CodeSnapshot::Code(_) => ProjectType::SingleFile,
        }
    }

    /// View the snapshot as path -> content. Single-file code is placed
    /// under [`legacy_file_name`].
    pub fn as_file_map(&self) -> BTreeMap<String, String> {
        match self {
            CodeSnapshot::Files(files) => files.clone(),
            CodeSnapshot::Code(code) => {
                BTreeMap::from([(legacy_file_name(code).to_string(), code.clone())])
            }
        }
    }
}

/// File name a single-file snapshot is exported under.
pub fn legacy_file_name(code: &str) -> &'static str {
    let head = code.trim_start();
    let lower: String = head.chars().take(9).collect::<String>().to_ascii_lowercase();
    if lower.starts_with("<!doctype") || lower.starts_with("<html") {
        "index.html"
    } else {
        "App.jsx"
    }
}

/// Derive a display name: the first 30 characters of the prompt, with
/// `...` appended when the prompt is longer.
pub fn project_name_from_prompt(prompt: &str) -> String {
    let prompt = prompt.trim();
    let mut name: String = prompt.chars().take(PROJECT_NAME_CHARS).collect();
    if prompt.chars().count() > PROJECT_NAME_CHARS {
        name.push_str("...");
    }
    name
}

/// A saved project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectRecord {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub prompt: String,
    pub project_type: ProjectType,
    pub current_version: u32,
    pub created_at: String,
    pub updated_at: String,
}

/// One stored version of a project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionRecord {
    pub project_id: String,
    pub version_number: u32,
    pub code_snapshot: CodeSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: String,
}

/// Version listing entry (snapshot omitted)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionSummary {
    pub version_number: u32,
    pub project_type: ProjectType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: String,
}

/// Input to `ProjectStore::save`
#[derive(Debug, Clone)]
pub struct NewProject {
    pub user_id: String,
    pub prompt: String,
    pub name: Option<String>,
    pub snapshot: CodeSnapshot,
}

/// Per-file change status between two versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStatus {
    Added,
    Removed,
    Modified,
    Unchanged,
}

/// Diff of one file path between two versions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileDiff {
    pub path: String,
    pub status: DiffStatus,
    /// Unified diff text; empty when unchanged
    pub unified: String,
}

// ── Request bodies ─────────────────────────────────────────────────────

/// `POST /api/projects`
#[derive(Debug, Clone, Deserialize)]
pub struct SaveProjectRequest {
    pub prompt: String,
    #[serde(default)]
    pub files: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// `PUT /api/projects/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub files: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// `POST /api/export`
#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub files: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

// ── Response bodies ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub project: ProjectRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: VersionRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionListResponse {
    pub versions: Vec<VersionSummary>,
    pub current_version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreResponse {
    pub restored_code: CodeSnapshot,
    pub version: VersionRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffResponse {
    pub from: u32,
    pub to: u32,
    pub files: Vec<FileDiff>,
}
