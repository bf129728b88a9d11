//! Request Handlers
//!
//! One module per API area. Handlers take the shared [`AppState`] and a
//! parsed request and produce a response; routing lives in the server.
//!
//! [`AppState`]: crate::state::AppState

pub mod export;
pub mod generate;
pub mod health;
pub mod projects;

pub use export::export_project;
pub use generate::{generate, generation_error_response, outcome_response};
pub use health::health;
pub use projects::{
    delete_project, diff_versions, get_version, list_projects, list_versions, restore_version,
    save_project, update_project,
};
