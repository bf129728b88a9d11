//! Project Store
//!
//! Persistence for saved projects and their dense, 1-based version
//! history. Every operation is scoped to the owning user; a project that
//! belongs to someone else is reported as not found.

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

use crate::models::project::{
    project_name_from_prompt, CodeSnapshot, NewProject, ProjectRecord, ProjectType, VersionRecord,
    VersionSummary,
};
use crate::storage::database::{Database, ProjectRow, VersionRow};
use crate::utils::error::{AppError, AppResult};

/// Storage contract for projects and versions
pub trait ProjectStore: Send + Sync {
    /// Create a project and its version 1
    fn save(&self, project: NewProject) -> AppResult<ProjectRecord>;

    fn get(&self, project_id: &str, user_id: &str) -> AppResult<ProjectRecord>;

    /// Append the next version
    fn append_version(
        &self,
        project_id: &str,
        user_id: &str,
        snapshot: CodeSnapshot,
        note: Option<String>,
    ) -> AppResult<VersionRecord>;

    /// Projects owned by `user_id`, most recently updated first
    fn list(&self, user_id: &str) -> AppResult<Vec<ProjectRecord>>;

    fn delete(&self, project_id: &str, user_id: &str) -> AppResult<()>;

    /// Versions oldest first
    fn list_versions(&self, project_id: &str, user_id: &str) -> AppResult<Vec<VersionSummary>>;

    fn get_version(&self, project_id: &str, user_id: &str, version_number: u32)
        -> AppResult<VersionRecord>;

    /// Append a new version whose snapshot equals version `version_number`
    fn restore(&self, project_id: &str, user_id: &str, version_number: u32)
        -> AppResult<VersionRecord>;
}

/// [`ProjectStore`] over the pooled SQLite database
#[derive(Clone)]
pub struct SqliteProjectStore {
    db: Database,
}

impl SqliteProjectStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Store over a fresh in-memory database
    pub fn in_memory() -> AppResult<Self> {
        Ok(Self::new(Database::new_in_memory()?))
    }

    pub fn is_healthy(&self) -> bool {
        self.db.is_healthy()
    }

    fn require_project(&self, project_id: &str, user_id: &str) -> AppResult<ProjectRow> {
        self.db
            .get_project(project_id, user_id)?
            .ok_or_else(|| project_not_found(project_id))
    }
}

impl ProjectStore for SqliteProjectStore {
    fn save(&self, project: NewProject) -> AppResult<ProjectRecord> {
        if project.prompt.trim().is_empty() {
            return Err(AppError::validation("prompt is required"));
        }

        let now = timestamp();
        let name = project
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| project_name_from_prompt(&project.prompt));
        let row = ProjectRow {
            id: Uuid::new_v4().to_string(),
            user_id: project.user_id,
            name,
            prompt: project.prompt,
            project_type: project.snapshot.project_type().as_str().to_string(),
            current_version: 1,
            created_at: now.clone(),
            updated_at: now.clone(),
        };
        let version = VersionRow {
            project_id: row.id.clone(),
            version_number: 1,
            code_snapshot: serde_json::to_string(&project.snapshot)?,
            note: None,
            created_at: now,
        };

        self.db.insert_project(&row, &version)?;
        tracing::info!(project_id = %row.id, project_type = %row.project_type, "project saved");
        project_from_row(row)
    }

    fn get(&self, project_id: &str, user_id: &str) -> AppResult<ProjectRecord> {
        project_from_row(self.require_project(project_id, user_id)?)
    }

    fn append_version(
        &self,
        project_id: &str,
        user_id: &str,
        snapshot: CodeSnapshot,
        note: Option<String>,
    ) -> AppResult<VersionRecord> {
        let encoded = serde_json::to_string(&snapshot)?;
        let row = self
            .db
            .append_version(
                project_id,
                user_id,
                snapshot.project_type().as_str(),
                &encoded,
                note.as_deref(),
                &timestamp(),
            )?
            .ok_or_else(|| project_not_found(project_id))?;

        tracing::info!(project_id, version = row.version_number, "project version appended");
        version_from_row(row)
    }

    fn list(&self, user_id: &str) -> AppResult<Vec<ProjectRecord>> {
        self.db
            .list_projects(user_id)?
            .into_iter()
            .map(project_from_row)
            .collect()
    }

    fn delete(&self, project_id: &str, user_id: &str) -> AppResult<()> {
        if !self.db.delete_project(project_id, user_id)? {
            return Err(project_not_found(project_id));
        }
        tracing::info!(project_id, "project deleted");
        Ok(())
    }

    fn list_versions(&self, project_id: &str, user_id: &str) -> AppResult<Vec<VersionSummary>> {
        self.require_project(project_id, user_id)?;
        self.db
            .list_versions(project_id)?
            .into_iter()
            .map(|row| {
                let version = version_from_row(row)?;
                Ok(VersionSummary {
                    version_number: version.version_number,
                    project_type: version.code_snapshot.project_type(),
                    note: version.note,
                    created_at: version.created_at,
                })
            })
            .collect()
    }

    fn get_version(
        &self,
        project_id: &str,
        user_id: &str,
        version_number: u32,
    ) -> AppResult<VersionRecord> {
        self.require_project(project_id, user_id)?;
        let row = self
            .db
            .get_version(project_id, i64::from(version_number))?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Version {} not found for project {}",
                    version_number, project_id
                ))
            })?;
        version_from_row(row)
    }

    fn restore(
        &self,
        project_id: &str,
        user_id: &str,
        version_number: u32,
    ) -> AppResult<VersionRecord> {
        let source = self.get_version(project_id, user_id, version_number)?;
        self.append_version(
            project_id,
            user_id,
            source.code_snapshot,
            Some(format!("Restored from version {}", version_number)),
        )
    }
}

fn project_not_found(project_id: &str) -> AppError {
    AppError::not_found(format!("Project not found: {}", project_id))
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn project_from_row(row: ProjectRow) -> AppResult<ProjectRecord> {
    let project_type = ProjectType::parse(&row.project_type).ok_or_else(|| {
        AppError::database(format!("Unknown project type: {}", row.project_type))
    })?;
    Ok(ProjectRecord {
        id: row.id,
        user_id: row.user_id,
        name: row.name,
        prompt: row.prompt,
        project_type,
        current_version: to_version_number(row.current_version)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn version_from_row(row: VersionRow) -> AppResult<VersionRecord> {
    Ok(VersionRecord {
        code_snapshot: serde_json::from_str(&row.code_snapshot)?,
        version_number: to_version_number(row.version_number)?,
        project_id: row.project_id,
        note: row.note,
        created_at: row.created_at,
    })
}

fn to_version_number(value: i64) -> AppResult<u32> {
    u32::try_from(value)
        .map_err(|_| AppError::database(format!("Invalid version number: {}", value)))
}
