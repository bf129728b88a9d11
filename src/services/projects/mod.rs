//! Project Services
//!
//! Saved projects with version history, zip export and version diffs.

pub mod diff;
pub mod export;
pub mod store;

pub use diff::diff_snapshots;
pub use export::{export_file_name, export_zip, ExportArchive, DEFAULT_EXPORT_NAME};
pub use store::{ProjectStore, SqliteProjectStore};
