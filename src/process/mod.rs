//! Process table access and state classification.
//!
//! This module provides:
//! - `source`: the `ProcessSource` abstraction over the OS process table
//! - `procfs`: `ProcessSource` over Linux /proc
//! - `classifier`: kernel task-state flags and category mapping

pub mod classifier;
pub mod procfs;
pub mod source;

// Re-export commonly used types
pub use classifier::{classify_state, is_zombie, StateCategory};
pub use procfs::{parse_proc_stat, read_proc_stat, ProcEntry, ProcStat, ProcfsSource};
pub use source::ProcessSource;
