use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::config::LauncherConfig;
use crate::error::LauncherError;
use crate::process::{ProcessId, ServiceCommand, ServiceKind, TerminationResult, ToolCommand};

/// Downloadable piece of the distribution bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub url: String,
    pub file_name: String,
    /// Directory the archive unpacks to; `None` for artifacts used as-is
    pub unpacked_dir: Option<String>,
}

/// Archive produced by `package` and the tool invocation creating it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub archive: PathBuf,
    pub command: ToolCommand,
}

/// OS-specific capabilities the lifecycle controller relies on
///
/// Exactly one implementation is selected per platform when the program starts;
/// nothing outside an implementation branches on the operating system.
#[async_trait]
pub trait PlatformLauncher: Send + Sync {
    /// Platform name for logging and archive naming
    fn platform_name(&self) -> &'static str;

    /// Java executable, taken from `java_home` when given, otherwise from `PATH`
    fn java_binary(&self, java_home: Option<&Path>) -> PathBuf;

    /// Command printing the Java version on stdout
    fn version_command(&self, java: &Path) -> ToolCommand {
        ToolCommand::new(java.display(), ["--version"])
    }

    /// Build the command, environment and log target for a service.
    /// Fails only when a required executable cannot be resolved.
    fn build_command(
        &self,
        service: ServiceKind,
        config: &LauncherConfig,
        extra_args: &[String],
    ) -> Result<ServiceCommand, LauncherError>;

    /// Start the process with stdout and stderr redirected to `log`
    async fn spawn(
        &self,
        command: &ServiceCommand,
        log: std::fs::File,
        detached: bool,
    ) -> Result<ProcessId, LauncherError>;

    /// `root` plus all descendants, ordered so that killing front to back never
    /// orphans a running child. Empty when `root` is gone.
    async fn process_tree(&self, root: ProcessId) -> Vec<ProcessId>;

    /// Immediate termination; an already dead process yields `ProcessNotFound`
    async fn kill(&self, pid: ProcessId) -> TerminationResult;

    /// Open the service's web page in the default browser
    async fn open_browser(&self, service: ServiceKind) -> anyhow::Result<()>;

    /// Artifacts to fetch before bundling
    fn package_artifacts(&self, config: &LauncherConfig) -> Vec<Artifact>;

    /// Command unpacking `archive` into `dest`
    fn extract_command(&self, archive: &Path, dest: &Path) -> ToolCommand;

    /// Archive name and command creating the distributable bundle
    fn bundle(&self, config: &LauncherConfig) -> Bundle;
}

/// Connector runtime bundle, shared by every platform
pub fn connectors_artifact(config: &LauncherConfig) -> Artifact {
    let version = &config.camunda_version;
    Artifact {
        url: format!(
            "https://repo1.maven.org/maven2/io/camunda/connector/connector-runtime-bundle/{version}/{}",
            config.connectors_jar_name()
        ),
        file_name: config.connectors_jar_name(),
        unpacked_dir: None,
    }
}

/// Entries of the base directory that make up a bundle
pub fn bundle_entries(config: &LauncherConfig, launcher_binary: &str) -> Vec<String> {
    let mut entries = vec![
        launcher_binary.to_string(),
        "endpoints.txt".to_string(),
        "configuration".to_string(),
        "connectors-application.properties".to_string(),
        config.connectors_jar_name(),
    ];
    for dir in [config.elasticsearch_dir(), config.camunda_dir()] {
        if let Some(name) = dir.file_name() {
            entries.push(name.to_string_lossy().into_owned());
        }
    }
    entries
}
