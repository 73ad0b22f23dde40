//! Error types for snapshot generation and report publication.

use std::path::PathBuf;

/// Failures while reading the process table.
#[derive(Debug, thiserror::Error)]
pub enum CensusError {
    /// The process listing facility could not be read at all.
    #[error("process table unavailable at {}: {source}", path.display())]
    EnumerationUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single process exited while it was being read. Never surfaced by
    /// `generate_snapshot`; the affected record is dropped instead.
    #[error("process {pid} vanished during read")]
    ProcessVanished { pid: u32 },
}

/// Failures of the publication channel.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("report resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("no report registered under '{0}'")]
    NotFound(String),

    #[error(transparent)]
    Census(#[from] CensusError),
}
