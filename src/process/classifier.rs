//! Scheduling-state classification for processes.
//!
//! This module maps a raw kernel task-state bitmask onto one of the fixed
//! [`StateCategory`] bins, decides zombie-ness from the exit state, and
//! translates the state letters found in `/proc/<pid>/stat` back into the
//! kernel flag values they stand for.

use serde::Serialize;
use std::fmt;

// Kernel task-state flags (include/linux/sched.h).
pub const TASK_RUNNING: u64 = 0x0000;
pub const TASK_INTERRUPTIBLE: u64 = 0x0001;
pub const TASK_UNINTERRUPTIBLE: u64 = 0x0002;
pub const __TASK_STOPPED: u64 = 0x0004;
pub const __TASK_TRACED: u64 = 0x0008;
pub const EXIT_DEAD: u64 = 0x0010;
pub const EXIT_ZOMBIE: u64 = 0x0020;
pub const TASK_PARKED: u64 = 0x0040;
pub const TASK_DEAD: u64 = 0x0080;
pub const TASK_WAKEKILL: u64 = 0x0100;
pub const TASK_WAKING: u64 = 0x0200;
pub const TASK_NOLOAD: u64 = 0x0400;

/// A stopped task carries both the wake-kill and the stopped flag.
pub const TASK_STOPPED: u64 = TASK_WAKEKILL | __TASK_STOPPED;
/// A traced task carries both the wake-kill and the traced flag.
pub const TASK_TRACED: u64 = TASK_WAKEKILL | __TASK_TRACED;
pub const TASK_IDLE: u64 = TASK_UNINTERRUPTIBLE | TASK_NOLOAD;

/// Fixed set of scheduling-state bins a process is counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StateCategory {
    Running,
    Interruptible,
    Uninterruptible,
    Stopped,
    Traced,
    Other,
}

impl StateCategory {
    /// Number of categories.
    pub const COUNT: usize = 6;

    /// All categories in report order.
    pub const ALL: [StateCategory; Self::COUNT] = [
        StateCategory::Running,
        StateCategory::Interruptible,
        StateCategory::Uninterruptible,
        StateCategory::Stopped,
        StateCategory::Traced,
        StateCategory::Other,
    ];

    /// Label used in the STAT block of the report.
    pub fn label(self) -> &'static str {
        match self {
            StateCategory::Running => "running",
            StateCategory::Interruptible => "interruptible",
            StateCategory::Uninterruptible => "uninterruptible",
            StateCategory::Stopped => "stopped",
            StateCategory::Traced => "traced",
            StateCategory::Other => "other",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classifies a raw task state. The whole flag set is compared, so a stopped
/// flag without wake-kill (or any state not listed) ends up in `Other`.
pub fn classify_state(raw_state: u64) -> StateCategory {
    match raw_state {
        TASK_RUNNING => StateCategory::Running,
        TASK_INTERRUPTIBLE => StateCategory::Interruptible,
        TASK_UNINTERRUPTIBLE => StateCategory::Uninterruptible,
        TASK_STOPPED => StateCategory::Stopped,
        TASK_TRACED => StateCategory::Traced,
        _ => StateCategory::Other,
    }
}

/// Zombie-ness comes from the exit state, independent of the task state.
pub fn is_zombie(exit_state: u64) -> bool {
    exit_state & EXIT_ZOMBIE != 0
}

/// Converts the state letter of `/proc/<pid>/stat` into kernel task flags.
pub fn raw_state_from_letter(letter: char) -> u64 {
    match letter {
        'R' => TASK_RUNNING,
        'S' => TASK_INTERRUPTIBLE,
        'D' => TASK_UNINTERRUPTIBLE,
        'T' => TASK_STOPPED,
        't' => TASK_TRACED,
        'Z' | 'X' | 'x' => TASK_DEAD,
        'P' => TASK_PARKED,
        'I' => TASK_IDLE,
        'W' => TASK_WAKING,
        'K' => TASK_WAKEKILL,
        _ => TASK_DEAD | TASK_NOLOAD,
    }
}

/// Converts the state letter of `/proc/<pid>/stat` into kernel exit-state flags.
pub fn exit_state_from_letter(letter: char) -> u64 {
    match letter {
        'Z' => EXIT_ZOMBIE,
        'X' | 'x' => EXIT_DEAD,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_basic_states() {
        assert_eq!(classify_state(TASK_RUNNING), StateCategory::Running);
        assert_eq!(classify_state(TASK_INTERRUPTIBLE), StateCategory::Interruptible);
        assert_eq!(
            classify_state(TASK_UNINTERRUPTIBLE),
            StateCategory::Uninterruptible
        );
    }

    #[test]
    fn test_classify_stopped_requires_wakekill() {
        assert_eq!(classify_state(TASK_STOPPED), StateCategory::Stopped);
        assert_eq!(classify_state(260), StateCategory::Stopped);

        // Either flag alone is not a stopped task
        assert_eq!(classify_state(__TASK_STOPPED), StateCategory::Other);
        assert_eq!(classify_state(TASK_WAKEKILL), StateCategory::Other);
    }

    #[test]
    fn test_classify_traced_is_distinct_from_stopped() {
        assert_eq!(classify_state(TASK_TRACED), StateCategory::Traced);
        assert_eq!(classify_state(__TASK_TRACED), StateCategory::Other);
        assert_ne!(classify_state(TASK_TRACED), classify_state(TASK_STOPPED));
    }

    #[test]
    fn test_classify_unknown_states_are_other() {
        assert_eq!(classify_state(TASK_IDLE), StateCategory::Other);
        assert_eq!(classify_state(TASK_PARKED), StateCategory::Other);
        assert_eq!(classify_state(TASK_DEAD), StateCategory::Other);
        assert_eq!(classify_state(u64::MAX), StateCategory::Other);
    }

    #[test]
    fn test_is_zombie() {
        assert!(is_zombie(EXIT_ZOMBIE));
        assert!(is_zombie(EXIT_ZOMBIE | EXIT_DEAD));
        assert!(!is_zombie(EXIT_DEAD));
        assert!(!is_zombie(0));
    }

    #[test]
    fn test_letter_mapping_round_trips_through_classifier() {
        assert_eq!(classify_state(raw_state_from_letter('R')), StateCategory::Running);
        assert_eq!(
            classify_state(raw_state_from_letter('S')),
            StateCategory::Interruptible
        );
        assert_eq!(
            classify_state(raw_state_from_letter('D')),
            StateCategory::Uninterruptible
        );
        assert_eq!(classify_state(raw_state_from_letter('T')), StateCategory::Stopped);
        assert_eq!(classify_state(raw_state_from_letter('t')), StateCategory::Traced);
        assert_eq!(classify_state(raw_state_from_letter('I')), StateCategory::Other);
        assert_eq!(classify_state(raw_state_from_letter('?')), StateCategory::Other);
    }

    #[test]
    fn test_exit_state_from_letter() {
        assert!(is_zombie(exit_state_from_letter('Z')));
        assert!(!is_zombie(exit_state_from_letter('X')));
        assert_eq!(exit_state_from_letter('S'), 0);
    }

    #[test]
    fn test_labels_follow_report_order() {
        let labels: Vec<&str> = StateCategory::ALL.iter().map(|c| c.label()).collect();
        assert_eq!(
            labels,
            vec![
                "running",
                "interruptible",
                "uninterruptible",
                "stopped",
                "traced",
                "other"
            ]
        );
        for (i, c) in StateCategory::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }
}
