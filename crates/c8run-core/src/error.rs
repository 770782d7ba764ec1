use crate::process::ServiceKind;
use std::path::PathBuf;
use thiserror::Error;

/// Core error types for launcher operations
#[derive(Error, Debug)]
pub enum LauncherError {
    #[error(
        "Java needs to be installed. Please install JDK {required} or newer. \
         If java is already installed, try explicitly setting JAVA_HOME and JAVA_VERSION"
    )]
    JavaMissing { required: u32 },

    #[error("Unrecognised Java version: {0:?}")]
    JavaVersionMalformed(String),

    #[error("You must use at least JDK {required} to start Camunda Platform Run (found {found})")]
    JavaTooOld { found: u32, required: u32 },

    #[error("Required executable not found: {}", .0.display())]
    MissingExecutable(PathBuf),

    #[error("Failed to open file {}: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start {service}: {source}")]
    SpawnFailed {
        service: ServiceKind,
        #[source]
        source: std::io::Error,
    },

    #[error("Pid file error at {}: {source}", path.display())]
    PidFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed pid file {}: {content:?}", path.display())]
    MalformedPid { path: PathBuf, content: String },

    #[error("{name} did not start after {attempts} attempts")]
    ServiceUnhealthy { name: String, attempts: u32 },

    #[error("Packaging failed: {0}")]
    Package(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl LauncherError {
    /// Check if this error is absorbed locally instead of ending the program
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LauncherError::MalformedPid { .. })
    }

    /// Process exit status when this error ends the program
    pub fn exit_code(&self) -> i32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = LauncherError::ServiceUnhealthy {
            name: "Elasticsearch".to_string(),
            attempts: 13,
        };
        assert_eq!(format!("{error}"), "Elasticsearch did not start after 13 attempts");

        let error = LauncherError::JavaTooOld {
            found: 17,
            required: 21,
        };
        let display = format!("{error}");
        assert!(display.contains("at least JDK 21"));
        assert!(display.contains("found 17"));
    }

    #[test]
    fn test_error_categorization() {
        let malformed = LauncherError::MalformedPid {
            path: PathBuf::from("camunda.pid"),
            content: "abc".to_string(),
        };
        assert!(malformed.is_recoverable());
        assert_eq!(malformed.exit_code(), 1);

        let fatal = [
            LauncherError::JavaMissing { required: 21 },
            LauncherError::MissingExecutable(PathBuf::from("bin/camunda")),
            LauncherError::SpawnFailed {
                service: ServiceKind::SearchEngine,
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            },
            LauncherError::Package("tar failed".to_string()),
        ];
        for error in fatal {
            assert!(!error.is_recoverable(), "{error:?}");
            assert_eq!(error.exit_code(), 1);
        }
    }

    #[test]
    fn test_error_debug_format() {
        let error = LauncherError::JavaVersionMalformed("x.y".to_string());
        let debug_str = format!("{error:?}");
        assert!(debug_str.contains("JavaVersionMalformed"));
        assert!(debug_str.contains("x.y"));
    }
}
