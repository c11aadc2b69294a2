// ABOUTME: Library root for escape - exposes the orchestration core for the CLI and tests.
// ABOUTME: The main binary is in main.rs.

pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod expr;
pub mod output;
pub mod release;
pub mod state;
pub mod types;
