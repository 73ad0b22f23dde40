//! Startup requirement validation for psinfo.
//!
//! This module validates that the service can read the process table and
//! publish its socket before it starts.

use nix::unistd::geteuid;
use psinfo::{ProcessSource, ProcfsSource};
use std::path::Path;
use tracing::{error, info, warn};

/// Validate all runtime requirements
pub fn validate_requirements(
    proc_root: &Path,
    socket_path: Option<&Path>,
) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    check_user_privileges();
    check_proc_access(proc_root)?;

    if let Some(path) = socket_path {
        check_socket_dir(path)?;
    }

    info!("✅ All runtime requirements validated");
    Ok(())
}

/// Check if running with sufficient privileges
fn check_user_privileges() {
    if !geteuid().is_root() {
        warn!("⚠️  Not running as root - processes hidden by hidepid will be missing");
    } else {
        info!("✅ Running as root (uid=0)");
    }
}

/// Check that the process table can be listed
fn check_proc_access(proc_root: &Path) -> Result<(), ValidationError> {
    let source = ProcfsSource::new(proc_root);
    match source.list_processes() {
        Ok(entries) if entries.is_empty() => {
            warn!("⚠️  {} lists no processes", proc_root.display());
            Ok(())
        }
        Ok(entries) => {
            info!(
                "✅ {} access: {} processes visible",
                proc_root.display(),
                entries.len()
            );
            Ok(())
        }
        Err(e) => {
            error!("❌ Cannot list processes: {}", e);
            error!("   Check that procfs is mounted at {}", proc_root.display());
            Err(ValidationError::ProcUnreadable(e.to_string()))
        }
    }
}

/// Check that the directory holding the socket exists
fn check_socket_dir(socket_path: &Path) -> Result<(), ValidationError> {
    let dir = match socket_path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    if !dir.is_dir() {
        error!("❌ Socket directory {} does not exist", dir.display());
        return Err(ValidationError::SocketDirMissing(dir.display().to_string()));
    }
    info!("✅ Socket directory {} exists", dir.display());
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Process table unreadable: {0}")]
    ProcUnreadable(String),

    #[error("Socket directory missing: {0}")]
    SocketDirMissing(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_proc_root_fails() {
        let dir = tempdir().unwrap();
        let result = validate_requirements(&dir.path().join("nope"), None);
        assert!(matches!(result, Err(ValidationError::ProcUnreadable(_))));
    }

    #[test]
    fn test_socket_dir_must_exist() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing").join("psinfo.sock");
        assert!(matches!(
            validate_requirements(dir.path(), Some(&missing)),
            Err(ValidationError::SocketDirMissing(_))
        ));
        assert!(validate_requirements(dir.path(), Some(&dir.path().join("ok.sock"))).is_ok());
    }
}
