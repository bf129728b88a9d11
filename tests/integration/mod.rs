//! Integration Tests Module
//!
//! End-to-end tests over the public library API: the generation pipeline
//! against a scripted model provider, the JSON scanner and repairer over
//! realistic payloads, the project routes over an in-memory database, and
//! the HTTP transport over a loopback socket.

// Scripted provider and state fixtures
mod support;

// Generation pipeline scenarios
mod generation_test;

// Scanner and repairer properties
mod repair_test;

// Project persistence, versions, diff and export
mod projects_test;

// HTTP transport
mod server_test;
