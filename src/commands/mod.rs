//! CLI command implementations for psinfo.
//!
//! This module provides implementations for all CLI subcommands:
//! - `view`: Print the report published on the named socket
//! - `snapshot`: Generate one report in-process
//! - `check`: System validation
//! - `config`: Configuration file generation

pub mod check;
pub mod config;
pub mod snapshot;
pub mod view;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use snapshot::command_snapshot;
pub use view::command_view;
