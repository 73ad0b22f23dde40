//! Plain-text report rendering.
//!
//! The layout is consumed by external readers and must stay byte-compatible:
//!
//! ```text
//! name:<name, width 20>pid:<pid> state:<raw state> parent:<parent, width 20>
//! ===================STAT==================
//! running:<n>
//! interruptible: <n>
//! ...
//! ```

use std::fmt::Write as FmtWrite;

use crate::process::StateCategory;
use crate::snapshot::{ProcessRecord, Snapshot};

/// Column width of the name and parent fields.
pub const NAME_WIDTH: usize = 20;

/// Line separating the listing from the counts.
pub const DIVIDER: &str = "===================STAT==================";

/// Renders `snapshot` as the report text. Deterministic for a given snapshot.
pub fn render(snapshot: &Snapshot) -> String {
    // Roughly 80 bytes per listing line plus the STAT block
    let mut out = String::with_capacity(snapshot.records().len() * 80 + 160);

    for record in snapshot.records() {
        write_record_line(&mut out, record);
    }

    writeln!(out, "{DIVIDER}").ok();
    for category in StateCategory::ALL {
        // "running:" has no space after the colon, every other line does
        let sep = if category == StateCategory::Running { "" } else { " " };
        writeln!(out, "{}:{}{}", category.label(), sep, snapshot.count(category)).ok();
    }
    writeln!(out, "zombie: {}", snapshot.zombie_count()).ok();
    writeln!(out, "total: {}", snapshot.total_count()).ok();
    out
}

fn write_record_line(out: &mut String, record: &ProcessRecord) {
    writeln!(
        out,
        "name:{:<width$}pid:{} state:{} parent:{:<width$}",
        record.name,
        record.pid,
        record.raw_state,
        record.parent_name,
        width = NAME_WIDTH
    )
    .ok();
}

/// Parses one listing line back into a record.
///
/// Padding is stripped, so names with trailing spaces do not survive the trip.
pub fn parse_record_line(line: &str) -> Option<ProcessRecord> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let rest = line.strip_prefix("name:")?;

    // The name column is at least NAME_WIDTH characters wide
    let column_end = rest
        .char_indices()
        .nth(NAME_WIDTH)
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    let pid_at = column_end + rest[column_end..].find("pid:")?;
    let name = rest[..pid_at].trim_end_matches(' ');
    let rest = &rest[pid_at + "pid:".len()..];

    let (pid, rest) = rest.split_once(" state:")?;
    let (raw_state, parent) = rest.split_once(" parent:")?;

    Some(ProcessRecord {
        name: name.to_string(),
        pid: pid.parse().ok()?,
        raw_state: raw_state.parse().ok()?,
        parent_name: parent.trim_end_matches(' ').to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CensusError;
    use crate::process::classifier::{EXIT_ZOMBIE, TASK_INTERRUPTIBLE, TASK_RUNNING};
    use crate::process::ProcessSource;
    use crate::snapshot::generate_snapshot;

    /// Source backed by a fixed list of `(pid, name, state, ppid, exit_state)`.
    struct ListSource(Vec<(u32, &'static str, u64, u32, u64)>);

    impl ProcessSource for ListSource {
        type Handle = usize;

        fn list_processes(&self) -> Result<Vec<usize>, CensusError> {
            Ok((0..self.0.len()).collect())
        }
        fn pid(&self, h: &usize) -> u32 {
            self.0[*h].0
        }
        fn name(&self, h: &usize) -> Option<String> {
            Some(self.0[*h].1.to_string())
        }
        fn parent(&self, h: &usize) -> Option<usize> {
            let ppid = self.0[*h].3;
            self.0.iter().position(|p| p.0 == ppid)
        }
        fn raw_state(&self, h: &usize) -> Option<u64> {
            Some(self.0[*h].2)
        }
        fn exit_state(&self, h: &usize) -> Option<u64> {
            Some(self.0[*h].4)
        }
    }

    fn scenario() -> Snapshot {
        generate_snapshot(&ListSource(vec![
            (1, "init", TASK_RUNNING, 0, 0),
            (50, "sh", TASK_INTERRUPTIBLE, 1, 0),
            (77, "zombie1", TASK_RUNNING, 50, EXIT_ZOMBIE),
        ]))
        .unwrap()
    }

    #[test]
    fn test_render_scenario_exact() {
        let expected = concat!(
            "name:init                pid:1 state:0 parent:None                \n",
            "name:sh                  pid:50 state:1 parent:init                \n",
            "name:zombie1             pid:77 state:0 parent:sh                  \n",
            "===================STAT==================\n",
            "running:2\n",
            "interruptible: 1\n",
            "uninterruptible: 0\n",
            "stopped: 0\n",
            "traced: 0\n",
            "other: 0\n",
            "zombie: 1\n",
            "total: 3\n",
        );
        assert_eq!(render(&scenario()), expected);
    }

    #[test]
    fn test_render_empty_snapshot() {
        let text = render(&Snapshot::default());
        assert!(text.starts_with(DIVIDER));
        assert!(text.ends_with("zombie: 0\ntotal: 0\n"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let s = scenario();
        assert_eq!(render(&s), render(&s));
    }

    #[test]
    fn test_parse_record_line_round_trip() {
        let s = scenario();
        let text = render(&s);
        let parsed: Vec<ProcessRecord> = text
            .lines()
            .take_while(|l| *l != DIVIDER)
            .map(|l| parse_record_line(l).expect("listing line should parse"))
            .collect();
        assert_eq!(parsed, s.records());
    }

    #[test]
    fn test_parse_record_line_with_pid_in_name() {
        let line = "name:pid:x               pid:9 state:1 parent:pid:y               ";
        let record = parse_record_line(line).unwrap();
        assert_eq!(record.name, "pid:x");
        assert_eq!(record.pid, 9);
        assert_eq!(record.parent_name, "pid:y");
    }

    #[test]
    fn test_parse_record_line_rejects_other_lines() {
        assert!(parse_record_line(DIVIDER).is_none());
        assert!(parse_record_line("running:2").is_none());
        assert!(parse_record_line("name:x                   pid:abc state:1 parent:y").is_none());
    }

    #[test]
    fn test_listing_fields_never_exceed_width() {
        let s = generate_snapshot(&ListSource(vec![(
            1,
            "this-name-is-far-too-long-for-the-column",
            TASK_RUNNING,
            0,
            0,
        )]))
        .unwrap();
        let text = render(&s);
        let line = text.lines().next().unwrap();
        let name_field = &line["name:".len().."name:".len() + NAME_WIDTH];
        assert!(name_field.ends_with(' '));
        assert!(line["name:".len() + NAME_WIDTH..].starts_with("pid:1 "));
    }
}
