//! Point-in-time process census.
//!
//! [`generate_snapshot`] walks a [`ProcessSource`] once and returns an immutable
//! [`Snapshot`]: the ordered per-process listing plus counts per
//! [`StateCategory`], zombies and the total.

use serde::Serialize;
use std::time::Instant;
use tracing::debug;

use crate::error::CensusError;
use crate::health_stats::HealthStats;
use crate::process::{classify_state, is_zombie, ProcessSource, StateCategory};

/// Longest display name kept, in characters (kernel TASK_COMM_LEN minus the NUL).
pub const MAX_NAME_LEN: usize = 15;

/// Placeholder parent name for processes without a parent.
pub const NO_PARENT: &str = "None";

/// One process as seen at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessRecord {
    pub name: String,
    pub pid: u32,
    pub raw_state: u64,
    pub parent_name: String,
}

impl ProcessRecord {
    pub fn category(&self) -> StateCategory {
        classify_state(self.raw_state)
    }
}

/// Number of processes per [`StateCategory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateCounts([u64; StateCategory::COUNT]);

impl StateCounts {
    pub fn get(&self, category: StateCategory) -> u64 {
        self.0[category.index()]
    }

    pub fn sum(&self) -> u64 {
        self.0.iter().sum()
    }

    fn increment(&mut self, category: StateCategory) {
        self.0[category.index()] += 1;
    }
}

impl Serialize for StateCounts {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(StateCategory::COUNT))?;
        for category in StateCategory::ALL {
            map.serialize_entry(category.label(), &self.get(category))?;
        }
        map.end()
    }
}

/// Immutable result of one census pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    records: Vec<ProcessRecord>,
    counts: StateCounts,
    zombie_count: u64,
    total_count: u64,
}

impl Snapshot {
    pub fn records(&self) -> &[ProcessRecord] {
        &self.records
    }

    pub fn counts(&self) -> &StateCounts {
        &self.counts
    }

    pub fn count(&self, category: StateCategory) -> u64 {
        self.counts.get(category)
    }

    pub fn zombie_count(&self) -> u64 {
        self.zombie_count
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }
}

/// Accumulates records while the process table is walked.
#[derive(Default)]
struct SnapshotBuilder {
    snapshot: Snapshot,
}

impl SnapshotBuilder {
    fn push(&mut self, record: ProcessRecord, zombie: bool) {
        let s = &mut self.snapshot;
        s.counts.increment(record.category());
        if zombie {
            s.zombie_count += 1;
        }
        s.total_count += 1;
        s.records.push(record);
    }

    fn finish(self) -> Snapshot {
        self.snapshot
    }
}

/// Truncates a display name to [`MAX_NAME_LEN`] characters.
pub fn truncate_name(name: &str) -> String {
    name.chars().take(MAX_NAME_LEN).collect()
}

/// Walks `source` once and classifies every process.
///
/// Fails only when the process table cannot be listed at all. Processes that
/// vanish while being read are dropped, and a parent that vanished is reported
/// as [`NO_PARENT`].
pub fn generate_snapshot<S: ProcessSource>(source: &S) -> Result<Snapshot, CensusError> {
    build_snapshot(source).map(|(snapshot, _)| snapshot)
}

/// Like [`generate_snapshot`], recording the outcome in `stats`.
pub fn generate_snapshot_with_stats<S: ProcessSource>(
    source: &S,
    stats: &HealthStats,
) -> Result<Snapshot, CensusError> {
    let start = Instant::now();
    match build_snapshot(source) {
        Ok((snapshot, omitted)) => {
            stats.record_snapshot(
                snapshot.total_count(),
                omitted,
                start.elapsed().as_secs_f64() * 1000.0,
            );
            Ok(snapshot)
        }
        Err(e) => {
            stats.record_snapshot_failure();
            Err(e)
        }
    }
}

fn build_snapshot<S: ProcessSource>(source: &S) -> Result<(Snapshot, u64), CensusError> {
    let start = Instant::now();
    let handles = source.list_processes()?;

    let mut builder = SnapshotBuilder::default();
    let mut omitted = 0u64;

    for handle in &handles {
        let pid = source.pid(handle);

        let (name, raw_state) = match (source.name(handle), source.raw_state(handle)) {
            (Some(name), Some(raw_state)) => (name, raw_state),
            _ => {
                debug!("Process {} vanished during snapshot, omitting", pid);
                omitted += 1;
                continue;
            }
        };

        let parent_name = source
            .parent(handle)
            .and_then(|parent| source.name(&parent))
            .map(|n| truncate_name(&n))
            .unwrap_or_else(|| NO_PARENT.to_string());

        let zombie = source.exit_state(handle).is_some_and(is_zombie);

        builder.push(
            ProcessRecord {
                name: truncate_name(&name),
                pid,
                raw_state,
                parent_name,
            },
            zombie,
        );
    }

    let snapshot = builder.finish();
    debug!(
        "Snapshot generated: {} processes ({} zombie, {} omitted) in {:.2}ms",
        snapshot.total_count(),
        snapshot.zombie_count(),
        omitted,
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok((snapshot, omitted))
}
