//! Data Models
//!
//! Contains all data structures used throughout the application.

pub mod generation;
pub mod project;
pub mod response;
pub mod settings;

pub use generation::*;
pub use project::*;
pub use response::*;
pub use settings::*;
