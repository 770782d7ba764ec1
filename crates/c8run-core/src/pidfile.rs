//! Marker files persisting a service's process id between `start` and `stop`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::LauncherError;
use crate::process::{ProcessId, ServiceKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<base_dir>/<service>.pid`
    pub fn for_service(base_dir: &Path, service: ServiceKind) -> Self {
        Self::new(base_dir.join(service.pid_file_name()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Replace the file content with the decimal pid
    pub async fn write(&self, pid: ProcessId) -> Result<(), LauncherError> {
        tokio::fs::write(&self.path, pid.to_string())
            .await
            .map_err(|source| LauncherError::PidFile {
                path: self.path.clone(),
                source,
            })?;
        debug!(pid = %pid, path = %self.path.display(), "Wrote pid file");
        Ok(())
    }

    /// `Ok(None)` when there is no marker file. Pid 0 names no process and
    /// is reported as malformed.
    pub async fn read(&self) -> Result<Option<ProcessId>, LauncherError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(LauncherError::PidFile {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        match content.parse::<ProcessId>() {
            Ok(pid) if pid.0 != 0 => Ok(Some(pid)),
            _ => Err(LauncherError::MalformedPid {
                path: self.path.clone(),
                content: content.trim().to_string(),
            }),
        }
    }

    /// Delete the marker file; a missing file is not an error
    pub async fn remove(&self) -> Result<(), LauncherError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Removed pid file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LauncherError::PidFile {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
