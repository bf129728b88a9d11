//! CmdShift Core
//!
//! Foundational types for the CmdShift backend workspace. This crate has zero
//! dependencies on application-level code (HTTP transport, database, LLM providers).
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `proxy` - Proxy configuration data types shared across workspace crates
//! - `json_scan` - Structural scanner for possibly-truncated JSON text
//! - `json_repair` - Best-effort closer for truncated JSON text
//!
//! ## Design Principles
//!
//! 1. **Zero external dependencies beyond serde/thiserror** - keeps build times minimal
//! 2. **Pure functions** - the scanner and repairer never allocate state beyond their input
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod error;
pub mod json_repair;
pub mod json_scan;
pub mod proxy;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── JSON Recovery ──────────────────────────────────────────────────────
pub use json_repair::{repair, RepairKind, RepairOutcome};
pub use json_scan::{scan, ScanResult};

// ── Proxy Types ────────────────────────────────────────────────────────
pub use proxy::{ProxyConfig, ProxyProtocol};
