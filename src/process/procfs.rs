//! Process scanning over the Linux /proc filesystem.
//!
//! This module implements [`ProcessSource`] by reading `/proc/<pid>/stat`.
//! Every listed entry is read once; entries that disappear between the
//! directory scan and the read are dropped.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::CensusError;
use crate::process::classifier::{exit_state_from_letter, raw_state_from_letter};
use crate::process::source::ProcessSource;

/// Fields of `/proc/<pid>/stat` the census needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcStat {
    pub pid: u32,
    pub comm: String,
    pub state: char,
    pub ppid: u32,
}

/// Process entry representing a directory in /proc filesystem.
#[derive(Debug, Clone)]
pub struct ProcEntry {
    pub pid: u32,
    pub stat: ProcStat,
}

/// [`ProcessSource`] backed by a procfs mount.
#[derive(Debug, Clone)]
pub struct ProcfsSource {
    root: PathBuf,
}

impl Default for ProcfsSource {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl ProcfsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_entry(&self, pid: u32) -> Result<ProcEntry, CensusError> {
        let stat = read_proc_stat(&self.root.join(pid.to_string()))
            .ok_or(CensusError::ProcessVanished { pid })?;
        Ok(ProcEntry { pid, stat })
    }
}

impl ProcessSource for ProcfsSource {
    type Handle = ProcEntry;

    fn list_processes(&self) -> Result<Vec<ProcEntry>, CensusError> {
        let entries =
            fs::read_dir(&self.root).map_err(|source| CensusError::EnumerationUnavailable {
                path: self.root.clone(),
                source,
            })?;

        let mut pids: Vec<u32> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name();
                let name = name.to_str()?;
                if !name.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                name.parse().ok()
            })
            .collect();
        pids.sort_unstable();

        let mut out = Vec::with_capacity(pids.len());
        for pid in pids {
            match self.read_entry(pid) {
                Ok(entry) => out.push(entry),
                Err(e) => debug!("Skipping process: {}", e),
            }
        }
        Ok(out)
    }

    fn pid(&self, handle: &ProcEntry) -> u32 {
        handle.pid
    }

    fn name(&self, handle: &ProcEntry) -> Option<String> {
        Some(handle.stat.comm.clone())
    }

    fn parent(&self, handle: &ProcEntry) -> Option<ProcEntry> {
        let ppid = handle.stat.ppid;
        if ppid == 0 {
            return None;
        }
        match self.read_entry(ppid) {
            Ok(parent) => Some(parent),
            Err(e) => {
                debug!("Parent of pid {} unreadable: {}", handle.pid, e);
                None
            }
        }
    }

    fn raw_state(&self, handle: &ProcEntry) -> Option<u64> {
        Some(raw_state_from_letter(handle.stat.state))
    }

    fn exit_state(&self, handle: &ProcEntry) -> Option<u64> {
        Some(exit_state_from_letter(handle.stat.state))
    }
}

/// Reads and parses `<proc_path>/stat`.
///
/// `comm` is raw bytes and may be cut mid-character at 15 bytes, so invalid
/// UTF-8 is replaced rather than rejected.
pub fn read_proc_stat(proc_path: &Path) -> Option<ProcStat> {
    let content = fs::read(proc_path.join("stat")).ok()?;
    parse_proc_stat(&String::from_utf8_lossy(&content))
}

/// Parses `pid (comm) state ppid ...`. The command name may itself contain
/// spaces and parentheses, so it spans from the first `(` to the last `)`.
pub fn parse_proc_stat(content: &str) -> Option<ProcStat> {
    let name_start = content.find('(')?;
    let name_end = content.rfind(')')?;
    if name_end < name_start {
        return None;
    }

    let pid = content[..name_start].trim().parse().ok()?;
    let comm = content[name_start + 1..name_end].to_string();

    let mut fields = content[name_end + 1..].split_whitespace();
    let state = fields.next()?.chars().next()?;
    let ppid = fields.next()?.parse().ok()?;

    Some(ProcStat {
        pid,
        comm,
        state,
        ppid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::classifier::{TASK_INTERRUPTIBLE, TASK_STOPPED};
    use tempfile::tempdir;

    fn write_stat(root: &Path, pid: u32, comm: &str, state: char, ppid: u32) {
        let dir = root.join(pid.to_string());
        fs::create_dir_all(&dir).expect("Failed to create pid dir");
        let content = format!(
            "{pid} ({comm}) {state} {ppid} {pid} {pid} 0 -1 4194304 100 0 0 0 1000 500 0 0 20 0 1 0 12345"
        );
        fs::write(dir.join("stat"), content).expect("Failed to write stat file");
    }

    // -------------------------------------------------------------------------
    // Tests for parse_proc_stat
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_proc_stat_simple() {
        let stat = parse_proc_stat("1234 (bash) S 1 1234 1234 0 -1").unwrap();
        assert_eq!(stat.pid, 1234);
        assert_eq!(stat.comm, "bash");
        assert_eq!(stat.state, 'S');
        assert_eq!(stat.ppid, 1);
    }

    #[test]
    fn test_parse_proc_stat_name_with_spaces_and_parens() {
        let stat = parse_proc_stat("42 (Web Content (x)) R 7 42 42 0").unwrap();
        assert_eq!(stat.comm, "Web Content (x)");
        assert_eq!(stat.state, 'R');
        assert_eq!(stat.ppid, 7);
    }

    #[test]
    fn test_parse_proc_stat_invalid() {
        assert!(parse_proc_stat("").is_none());
        assert!(parse_proc_stat("12 bash S 1").is_none());
        assert!(parse_proc_stat("12 (bash)").is_none());
        assert!(parse_proc_stat("x (bash) S 1").is_none());
    }

    // -------------------------------------------------------------------------
    // Tests for ProcfsSource
    // -------------------------------------------------------------------------

    #[test]
    fn test_list_processes_reads_numeric_entries_in_pid_order() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_stat(dir.path(), 50, "sh", 'S', 1);
        write_stat(dir.path(), 1, "init", 'S', 0);
        fs::create_dir_all(dir.path().join("self")).unwrap();
        fs::write(dir.path().join("uptime"), "1.0 1.0").unwrap();

        let source = ProcfsSource::new(dir.path());
        let entries = source.list_processes().unwrap();
        let pids: Vec<u32> = entries.iter().map(|e| source.pid(e)).collect();
        assert_eq!(pids, vec![1, 50]);
    }

    #[test]
    fn test_list_processes_skips_unreadable_entries() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_stat(dir.path(), 1, "init", 'S', 0);
        // Directory without stat file, as left behind by an exited process
        fs::create_dir_all(dir.path().join("99")).unwrap();

        let source = ProcfsSource::new(dir.path());
        let entries = source.list_processes().unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_list_processes_missing_root_is_unavailable() {
        let dir = tempdir().expect("Failed to create temp dir");
        let source = ProcfsSource::new(dir.path().join("missing"));
        let err = source.list_processes().unwrap_err();
        assert!(matches!(err, CensusError::EnumerationUnavailable { .. }));
    }

    #[test]
    fn test_parent_lookup() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_stat(dir.path(), 1, "init", 'S', 0);
        write_stat(dir.path(), 50, "sh", 'T', 1);
        write_stat(dir.path(), 60, "orphan", 'S', 59);

        let source = ProcfsSource::new(dir.path());
        let entries = source.list_processes().unwrap();

        let init = &entries[0];
        assert!(source.parent(init).is_none());

        let sh = &entries[1];
        let parent = source.parent(sh).expect("sh should have a parent");
        assert_eq!(source.name(&parent).as_deref(), Some("init"));
        assert_eq!(source.raw_state(sh), Some(TASK_STOPPED));

        // Parent 59 does not exist
        assert!(source.parent(&entries[2]).is_none());
    }

    #[test]
    fn test_non_utf8_comm_is_kept() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_stat(dir.path(), 1, "init", 'S', 0);
        // Name cut inside a two-byte character
        let child = dir.path().join("42");
        fs::create_dir_all(&child).unwrap();
        fs::write(child.join("stat"), b"42 (\xc3\xa4\xc3) S 1 42 42 0 -1".as_slice()).unwrap();
        let grandchild = dir.path().join("43");
        fs::create_dir_all(&grandchild).unwrap();
        fs::write(grandchild.join("stat"), b"43 (sh) S 42 43 43 0 -1".as_slice()).unwrap();

        let source = ProcfsSource::new(dir.path());
        let entries = source.list_processes().unwrap();
        let pids: Vec<u32> = entries.iter().map(|e| source.pid(e)).collect();
        assert_eq!(pids, vec![1, 42, 43]);
        assert_eq!(source.name(&entries[1]).as_deref(), Some("\u{e4}\u{fffd}"));

        let parent = source.parent(&entries[2]).expect("42 should be readable as a parent");
        assert_eq!(source.pid(&parent), 42);
        assert_eq!(source.name(&parent).as_deref(), Some("\u{e4}\u{fffd}"));
    }

    #[test]
    fn test_zombie_exit_state() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_stat(dir.path(), 1, "init", 'S', 0);
        write_stat(dir.path(), 77, "defunct", 'Z', 1);

        let source = ProcfsSource::new(dir.path());
        let entries = source.list_processes().unwrap();
        assert_eq!(source.exit_state(&entries[0]), Some(0));
        assert!(crate::process::is_zombie(
            source.exit_state(&entries[1]).unwrap()
        ));
        assert_eq!(source.raw_state(&entries[0]), Some(TASK_INTERRUPTIBLE));
    }
}
