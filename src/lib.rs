//! psinfo Process Census Library
//!
//! This library walks the live process table, classifies every process by its
//! kernel scheduling state and renders the result as a fixed-width text report.
//! It is transport-agnostic: the report is published through a
//! [`PublicationChannel`], and callers decide how readers reach it (the `psinfo`
//! binary serves it over a Unix socket and HTTP).
//!
//! # Features
//!
//! - **Pluggable process table**: [`ProcessSource`] abstracts enumeration;
//!   [`ProcfsSource`] reads Linux `/proc`
//! - **Point-in-time snapshots**: [`generate_snapshot`] produces an immutable
//!   [`Snapshot`] with per-state counts
//! - **Stable text format**: [`render`] emits the `name:/pid:/state:/parent:` listing
//!   followed by the `STAT` block
//! - **Pull-based publication**: every [`PublicationChannel::open`] computes a
//!   fresh snapshot
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::io::Read;
//! use std::sync::Arc;
//! use psinfo::{generate_snapshot, ProcfsSource, PublicationChannel};
//!
//! let channel = PublicationChannel::new();
//! let source = ProcfsSource::new("/proc");
//! let registration = channel
//!     .register("psinfo", Arc::new(move || generate_snapshot(&source)))
//!     .unwrap();
//!
//! let mut report = String::new();
//! channel.open("psinfo").unwrap().read_to_string(&mut report).unwrap();
//! print!("{report}");
//!
//! channel.unregister(registration);
//! ```

pub mod error;
pub mod health_stats;
pub mod process;
pub mod publish;
pub mod render;
pub mod snapshot;

// Re-export main types for convenience
pub use error::{CensusError, PublishError};
pub use health_stats::HealthStats;
pub use process::{classify_state, is_zombie, ProcessSource, ProcfsSource, StateCategory};
pub use publish::{PublicationChannel, Registration, ReportReader, SnapshotProvider};
pub use render::{parse_record_line, render};
pub use snapshot::{
    generate_snapshot, generate_snapshot_with_stats, ProcessRecord, Snapshot, StateCounts,
};
