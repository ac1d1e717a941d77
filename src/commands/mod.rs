//! CLI command implementations for sockmap.
//!
//! - `check`: proc filesystem and configuration validation
//! - `--test`: parser smoke checks

pub mod check;
pub mod selftest;

// Re-export command functions
pub use check::command_check;
pub use selftest::command_selftest;
