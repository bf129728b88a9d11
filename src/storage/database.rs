//! SQLite Database
//!
//! Embedded database for saved projects and their version history, using
//! rusqlite with r2d2 connection pooling.

use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Row};

use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{database_path, ensure_parent_dir};

/// Raw project row from the database
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub prompt: String,
    pub project_type: String,
    pub current_version: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Raw version row from the database
#[derive(Debug, Clone, PartialEq)]
pub struct VersionRow {
    pub project_id: String,
    pub version_number: i64,
    /// JSON-encoded snapshot
    pub code_snapshot: String,
    pub note: Option<String>,
    pub created_at: String,
}

/// Type alias for the connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Database service for managing SQLite operations
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create a database from an existing connection pool.
    pub fn from_pool(pool: DbPool) -> AppResult<Self> {
        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database for testing.
    ///
    /// The pool holds a single connection so every caller sees the same
    /// in-memory database.
    pub fn new_in_memory() -> AppResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;

        Self::from_pool(pool)
    }

    /// Open (or create) a file-backed database at `path`
    pub fn open(path: &Path) -> AppResult<Self> {
        ensure_parent_dir(path)?;

        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(10)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;

        Self::from_pool(pool)
    }

    /// Open the database at the default location (~/.cmdshift/projects.db)
    pub fn new() -> AppResult<Self> {
        Self::open(&database_path()?)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> AppResult<()> {
        let conn = self.get_connection()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                prompt TEXT NOT NULL,
                project_type TEXT NOT NULL CHECK(project_type IN ('multi-file', 'single-file')),
                current_version INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_projects_user
             ON projects(user_id, updated_at DESC)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS project_versions (
                project_id TEXT NOT NULL,
                version_number INTEGER NOT NULL,
                code_snapshot TEXT NOT NULL,
                note TEXT,
                created_at TEXT NOT NULL,
                PRIMARY KEY (project_id, version_number),
                FOREIGN KEY (project_id) REFERENCES projects(id)
            )",
            [],
        )?;

        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> AppResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| AppError::database(format!("Failed to get connection: {}", e)))
    }

    /// Check if the database is healthy
    pub fn is_healthy(&self) -> bool {
        if let Ok(conn) = self.pool.get() {
            conn.query_row("SELECT 1", [], |_| Ok(())).is_ok()
        } else {
            false
        }
    }

    /// Insert a project together with its first version
    pub fn insert_project(&self, project: &ProjectRow, first_version: &VersionRow) -> AppResult<()> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO projects
                (id, user_id, name, prompt, project_type, current_version, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                project.id,
                project.user_id,
                project.name,
                project.prompt,
                project.project_type,
                project.current_version,
                project.created_at,
                project.updated_at,
            ],
        )?;
        tx.execute(
            "INSERT INTO project_versions (project_id, version_number, code_snapshot, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                first_version.project_id,
                first_version.version_number,
                first_version.code_snapshot,
                first_version.note,
                first_version.created_at,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Get a project owned by `user_id`
    pub fn get_project(&self, id: &str, user_id: &str) -> AppResult<Option<ProjectRow>> {
        let conn = self.get_connection()?;
        let result = conn.query_row(
            "SELECT id, user_id, name, prompt, project_type, current_version, created_at, updated_at
             FROM projects
             WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
            Self::row_to_project,
        );

        match result {
            Ok(row) => Ok(Some(row)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::database(e.to_string())),
        }
    }

    /// List a user's projects, most recently updated first
    pub fn list_projects(&self, user_id: &str) -> AppResult<Vec<ProjectRow>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, prompt, project_type, current_version, created_at, updated_at
             FROM projects
             WHERE user_id = ?1
             ORDER BY updated_at DESC, created_at DESC",
        )?;

        let rows = stmt
            .query_map(params![user_id], Self::row_to_project)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Delete a project and its versions. Returns false when nothing matched.
    pub fn delete_project(&self, id: &str, user_id: &str) -> AppResult<bool> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM project_versions
             WHERE project_id IN (SELECT id FROM projects WHERE id = ?1 AND user_id = ?2)",
            params![id, user_id],
        )?;
        let deleted = tx.execute(
            "DELETE FROM projects WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;

        tx.commit()?;
        Ok(deleted > 0)
    }

    /// Append the next version to a project owned by `user_id`.
    ///
    /// The version number is `current_version + 1`, read and written inside
    /// one transaction. Returns `None` when the project does not exist for
    /// this user.
    pub fn append_version(
        &self,
        project_id: &str,
        user_id: &str,
        project_type: &str,
        code_snapshot: &str,
        note: Option<&str>,
        now: &str,
    ) -> AppResult<Option<VersionRow>> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        let current: i64 = match tx.query_row(
            "SELECT current_version FROM projects WHERE id = ?1 AND user_id = ?2",
            params![project_id, user_id],
            |row| row.get(0),
        ) {
            Ok(value) => value,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let version = VersionRow {
            project_id: project_id.to_string(),
            version_number: current + 1,
            code_snapshot: code_snapshot.to_string(),
            note: note.map(str::to_string),
            created_at: now.to_string(),
        };

        tx.execute(
            "INSERT INTO project_versions (project_id, version_number, code_snapshot, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                version.project_id,
                version.version_number,
                version.code_snapshot,
                version.note,
                version.created_at,
            ],
        )?;
        tx.execute(
            "UPDATE projects
             SET current_version = ?1, project_type = ?2, updated_at = ?3
             WHERE id = ?4",
            params![version.version_number, project_type, now, project_id],
        )?;

        tx.commit()?;
        Ok(Some(version))
    }

    /// List all versions of a project, oldest first
    pub fn list_versions(&self, project_id: &str) -> AppResult<Vec<VersionRow>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(
            "SELECT project_id, version_number, code_snapshot, note, created_at
             FROM project_versions
             WHERE project_id = ?1
             ORDER BY version_number ASC",
        )?;

        let rows = stmt
            .query_map(params![project_id], Self::row_to_version)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Get one version of a project
    pub fn get_version(&self, project_id: &str, version_number: i64) -> AppResult<Option<VersionRow>> {
        let conn = self.get_connection()?;
        let result = conn.query_row(
            "SELECT project_id, version_number, code_snapshot, note, created_at
             FROM project_versions
             WHERE project_id = ?1 AND version_number = ?2",
            params![project_id, version_number],
            Self::row_to_version,
        );

        match result {
            Ok(row) => Ok(Some(row)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::database(e.to_string())),
        }
    }

    fn row_to_project(row: &Row<'_>) -> rusqlite::Result<ProjectRow> {
        Ok(ProjectRow {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            prompt: row.get(3)?,
            project_type: row.get(4)?,
            current_version: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn row_to_version(row: &Row<'_>) -> rusqlite::Result<VersionRow> {
        Ok(VersionRow {
            project_id: row.get(0)?,
            version_number: row.get(1)?,
            code_snapshot: row.get(2)?,
            note: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}
