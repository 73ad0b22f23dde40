//! Abstraction over the operating system's process table.

use crate::error::CensusError;

/// Read-only view of the live process table.
///
/// Accessors return `None` when the process vanished (or its data could not be
/// read) after it was listed; the snapshot generator tolerates that per process.
pub trait ProcessSource {
    /// Opaque reference to one process.
    type Handle;

    /// Lists every live process exactly once.
    fn list_processes(&self) -> Result<Vec<Self::Handle>, CensusError>;

    fn pid(&self, handle: &Self::Handle) -> u32;

    /// Display name, not yet truncated.
    fn name(&self, handle: &Self::Handle) -> Option<String>;

    /// Parent process, `None` for the root of the tree or a parent that is gone.
    fn parent(&self, handle: &Self::Handle) -> Option<Self::Handle>;

    /// Raw kernel task-state bitmask.
    fn raw_state(&self, handle: &Self::Handle) -> Option<u64>;

    /// Raw kernel exit-state bitmask.
    fn exit_state(&self, handle: &Self::Handle) -> Option<u64>;
}
