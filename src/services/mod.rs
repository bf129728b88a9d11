//! Services
//!
//! Business logic services for the application.
//! Services handle the core functionality and are called by commands.

pub mod generation;
pub mod identity;
pub mod projects;

pub use generation::{GenerationError, GenerationOrchestrator, GenerationOutcome, RetryPolicy};
pub use identity::{DisabledIdentity, IdentityProvider, JwtIdentity, UserId};
pub use projects::{ProjectStore, SqliteProjectStore};
