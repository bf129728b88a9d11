//! CmdShift Backend
//!
//! Backend for the CmdShift web-project generator. It includes:
//! - The generation pipeline: tiered prompts, time-bounded model calls,
//!   truncation repair and a bounded retry state machine
//! - Saved projects with version history, zip export and diffs
//! - A small HTTP/1.1 JSON API over tokio
//! - Storage layer (SQLite, JSON config), data models and utilities

pub mod commands;
pub mod models;
pub mod server;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use models::response::*;
pub use models::settings::ServerConfig;
pub use server::Server;
pub use state::AppState;
pub use utils::error::{AppError, AppResult};
