//! Named socket transport for the published report.
//!
//! Each accepted connection is one read of the report: a fresh snapshot is
//! generated, the rendered text is written in full and the connection is
//! closed. A connection closed without any data means the report could not be
//! generated.

use psinfo::PublishError;
use std::fs;
use std::io;
use std::os::unix::fs::{FileTypeExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::net::{UnixListener, UnixStream};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::state::SharedState;

/// Pause after a failed accept, e.g. when out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Listening socket at a filesystem path; the path is removed on drop.
pub struct SocketServer {
    listener: UnixListener,
    path: PathBuf,
}

impl SocketServer {
    /// Binds `path`, replacing a stale socket left by a previous run.
    pub fn bind(path: &Path, mode: u32) -> Result<Self, PublishError> {
        let unavailable =
            |e: io::Error| PublishError::ResourceUnavailable(format!("{}: {}", path.display(), e));

        match fs::symlink_metadata(path) {
            Ok(meta) if meta.file_type().is_socket() => {
                debug!("Removing stale socket {}", path.display());
                fs::remove_file(path).map_err(unavailable)?;
            }
            Ok(_) => {
                return Err(PublishError::ResourceUnavailable(format!(
                    "{} exists and is not a socket",
                    path.display()
                )));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(unavailable(e)),
        }

        let listener = UnixListener::bind(path).map_err(unavailable)?;
        let server = Self {
            listener,
            path: path.to_path_buf(),
        };
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(unavailable)?;

        info!(
            "Report socket created at {} (mode {:o})",
            path.display(),
            mode
        );
        Ok(server)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accepts connections until the task is dropped.
    pub async fn serve(&self, state: SharedState) {
        loop {
            match self.listener.accept().await {
                Ok((stream, _)) => {
                    let state = state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, &state).await {
                            debug!("Report connection ended early: {}", e);
                        }
                    });
                }
                Err(e) => {
                    warn!("Failed to accept report connection: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}

impl Drop for SocketServer {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => info!("Report socket {} removed", self.path.display()),
            Err(e) => debug!("Could not remove socket {}: {}", self.path.display(), e),
        }
    }
}

async fn serve_connection(mut stream: UnixStream, state: &SharedState) -> io::Result<()> {
    match state.open_report().await {
        Ok(report) => {
            stream.write_all(&report.into_bytes()).await?;
            state.health_stats.record_socket_report();
        }
        Err(e) => {
            warn!("Report generation failed: {}", e);
        }
    }
    stream.shutdown().await
}
