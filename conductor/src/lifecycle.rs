//! Process lifecycle: run files in the data directory and shutdown signals.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use tracing::warn;

pub const PID_FILE_NAME: &str = "conductor.pid";
pub const HTTP_FILE_NAME: &str = "conductor.http";

/// `conductor.pid` and `conductor.http` under the data directory.
///
/// Both files are removed by [`RunFiles::remove`]; dropping the value does
/// not touch the disk.
#[derive(Debug)]
pub struct RunFiles {
    pid_file: PathBuf,
    http_file: PathBuf,
}

impl RunFiles {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            pid_file: data_dir.join(PID_FILE_NAME),
            http_file: data_dir.join(HTTP_FILE_NAME),
        }
    }

    pub async fn write_pid(&self) -> std::io::Result<()> {
        write_private(&self.pid_file, format!("{}\n", std::process::id())).await
    }

    pub async fn write_http(&self, addr: SocketAddr) -> std::io::Result<()> {
        write_private(&self.http_file, format!("{addr}\n")).await
    }

    pub async fn remove(&self) {
        for path in [&self.pid_file, &self.http_file] {
            if let Err(e) = tokio::fs::remove_file(path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "failed to remove run file");
                }
            }
        }
    }

    pub fn pid_file(&self) -> &Path {
        &self.pid_file
    }

    pub fn http_file(&self) -> &Path {
        &self.http_file
    }
}

async fn write_private(path: &Path, contents: String) -> std::io::Result<()> {
    tokio::fs::write(path, contents).await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    }
    Ok(())
}

/// Completes on SIGINT, SIGTERM or Ctrl-C.
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl-C only");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigterm.recv() => {},
    }
}

#[cfg(not(unix))]
pub async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
