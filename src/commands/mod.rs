//! CLI command implementations for memon.
//!
//! This module provides implementations for all CLI subcommands:
//! - `snapshot`: Process table capture
//! - `check`: Source and permission validation
//! - `config`: Configuration file generation

pub mod check;
pub mod config;
pub mod snapshot;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use snapshot::command_snapshot;
