//! View command implementation.
//!
//! Opens the named report socket and copies the report to stdout.

use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;

/// Failures of the viewer.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("Cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Report at {} is unavailable (no data received)", .0.display())]
    Empty(PathBuf),

    #[error("Failed to copy report: {0}")]
    Copy(#[from] io::Error),
}

/// Copies every byte of the published report to `out`.
pub async fn copy_report<W>(socket_path: &Path, out: &mut W) -> Result<u64, ViewError>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut stream = UnixStream::connect(socket_path)
        .await
        .map_err(|source| ViewError::Open {
            path: socket_path.to_path_buf(),
            source,
        })?;

    let copied = tokio::io::copy(&mut stream, out).await?;
    out.flush().await?;
    if copied == 0 {
        return Err(ViewError::Empty(socket_path.to_path_buf()));
    }
    Ok(copied)
}

/// Prints the published report.
pub async fn command_view(socket_path: &Path) -> Result<(), ViewError> {
    let mut stdout = tokio::io::stdout();
    copy_report(socket_path, &mut stdout).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::net::UnixListener;

    #[tokio::test]
    async fn test_missing_socket_is_open_failure() {
        let dir = tempdir().unwrap();
        let mut out = Vec::new();
        let err = copy_report(&dir.path().join("none.sock"), &mut out)
            .await
            .unwrap_err();
        assert!(matches!(err, ViewError::Open { .. }));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_copies_all_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.sock");
        let listener = UnixListener::bind(&path).unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream.write_all(b"line one\nline two\n").await.unwrap();
            stream.shutdown().await.unwrap();
        });

        let mut out = Vec::new();
        let copied = copy_report(&path, &mut out).await.unwrap();
        assert_eq!(copied, 18);
        assert_eq!(out, b"line one\nline two\n");
    }

    #[tokio::test]
    async fn test_empty_stream_is_unavailable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("e.sock");
        let listener = UnixListener::bind(&path).unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream.shutdown().await.unwrap();
        });

        let mut out = Vec::new();
        assert!(matches!(
            copy_report(&path, &mut out).await,
            Err(ViewError::Empty(_))
        ));
    }
}
