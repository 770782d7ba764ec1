use anyhow::{Context, Result};
use async_trait::async_trait;
use c8run_core::platform::{bundle_entries, connectors_artifact};
use c8run_core::{
    Artifact, Bundle, LauncherConfig, LauncherError, PlatformLauncher, ProcessId,
    ServiceCommand, ServiceKind, TerminationResult, ToolCommand, tree,
};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};
use sysinfo::System;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// CREATE_NO_WINDOW: no console window pops up for background services
const CREATE_NO_WINDOW: u32 = 0x0800_0000;
/// CREATE_NEW_PROCESS_GROUP: console Ctrl-C aimed at the launcher skips the child
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

/// Windows launcher: batch launch scripts, `taskkill` and the sysinfo process table
pub struct WindowsLauncher {
    system: Mutex<System>,
}

impl Default for WindowsLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowsLauncher {
    pub fn new() -> Self {
        info!("Initializing Windows launcher with system monitoring");
        Self {
            system: Mutex::new(System::new()),
        }
    }

    fn creation_flags(detached: bool) -> u32 {
        if detached {
            CREATE_NO_WINDOW | CREATE_NEW_PROCESS_GROUP
        } else {
            CREATE_NO_WINDOW
        }
    }

    fn require_file(path: PathBuf) -> Result<PathBuf, LauncherError> {
        if path.is_file() {
            Ok(path)
        } else {
            Err(LauncherError::MissingExecutable(path))
        }
    }

    fn resolve_java(&self, config: &LauncherConfig) -> Result<PathBuf, LauncherError> {
        let java = self.java_binary(config.java_home.as_deref());
        if config.java_home.is_some() {
            return Self::require_file(java);
        }
        Ok(java)
    }

    /// Use taskkill to force terminate a single process
    async fn taskkill(&self, pid: u32) -> Result<bool> {
        let output = Command::new("taskkill")
            .args(["/F", "/PID", &pid.to_string()])
            .stdin(Stdio::null())
            .output()
            .await?;

        Ok(output.status.success())
    }
}

#[async_trait]
impl PlatformLauncher for WindowsLauncher {
    fn platform_name(&self) -> &'static str {
        "windows"
    }

    fn java_binary(&self, java_home: Option<&Path>) -> PathBuf {
        match java_home {
            Some(home) => home.join("bin").join("java.exe"),
            None => PathBuf::from("java.exe"),
        }
    }

    fn build_command(
        &self,
        service: ServiceKind,
        config: &LauncherConfig,
        extra_args: &[String],
    ) -> Result<ServiceCommand, LauncherError> {
        let base = &config.base_dir;
        let (program, mut args) = match service {
            ServiceKind::SearchEngine => (
                Self::require_file(
                    config
                        .elasticsearch_dir()
                        .join("bin")
                        .join("elasticsearch.bat"),
                )?,
                vec![
                    "-E".to_string(),
                    "xpack.ml.enabled=false".to_string(),
                    "-E".to_string(),
                    "xpack.security.enabled=false".to_string(),
                ],
            ),
            ServiceKind::ConnectorRuntime => {
                let classpath = [
                    base.join("*"),
                    base.join("custom_connectors").join("*"),
                    config.camunda_dir().join("lib").join("*"),
                ]
                .iter()
                .map(|entry| entry.display().to_string())
                .collect::<Vec<_>>()
                .join(";");
                (
                    self.resolve_java(config)?,
                    vec![
                        "-cp".to_string(),
                        classpath,
                        "io.camunda.connector.runtime.app.ConnectorRuntimeApplication".to_string(),
                        format!(
                            "--spring.config.location={}",
                            base.join("connectors-application.properties").display()
                        ),
                    ],
                )
            }
            ServiceKind::WorkflowEngine => (
                Self::require_file(config.camunda_dir().join("bin").join("camunda.bat"))?,
                Vec::new(),
            ),
        };
        args.extend(extra_args.iter().cloned());

        ServiceCommand::builder()
            .service(service)
            .program(program)
            .args(args)
            .env_multi(config.env.clone())
            .working_directory(base.clone())
            .log_file(config.log_file(service))
            .build()
            .map_err(|e| LauncherError::Other(e.into()))
    }

    async fn spawn(
        &self,
        command: &ServiceCommand,
        log: std::fs::File,
        detached: bool,
    ) -> Result<ProcessId, LauncherError> {
        let stdout = log.try_clone().map_err(|source| LauncherError::FileOpen {
            path: command.log_file.clone(),
            source,
        })?;

        let mut cmd = command.to_command();
        cmd.stdout(Stdio::from(stdout)).stderr(Stdio::from(log));

        let flags = Self::creation_flags(detached);
        debug!(flags, detached, "Using process creation flags");
        #[cfg(windows)]
        cmd.creation_flags(flags);

        let child = cmd.spawn().map_err(|source| LauncherError::SpawnFailed {
            service: command.service,
            source,
        })?;

        let pid = child
            .id()
            .map(ProcessId)
            .ok_or_else(|| LauncherError::SpawnFailed {
                service: command.service,
                source: std::io::Error::other("process exited before its pid was read"),
            })?;

        info!(
            pid = %pid,
            program = %command.program.display(),
            args = ?command.args,
            "Spawned Windows process for {}", command.service
        );
        Ok(pid)
    }

    async fn process_tree(&self, root: ProcessId) -> Vec<ProcessId> {
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        tree::refresh(&mut system);
        tree::process_tree(&system, root)
    }

    async fn kill(&self, pid: ProcessId) -> TerminationResult {
        if pid.0 == 0 {
            return TerminationResult::ProcessNotFound;
        }

        match self.taskkill(pid.0).await {
            Ok(true) => {
                info!(pid = %pid, "Successfully force killed process");
                TerminationResult::Success
            }
            Ok(false) => {
                debug!(pid = %pid, "Process not found for force kill");
                TerminationResult::ProcessNotFound
            }
            Err(e) => {
                warn!(pid = %pid, error = %e, "Failed to run taskkill");
                TerminationResult::Failed(format!("taskkill failed: {e}"))
            }
        }
    }

    async fn open_browser(&self, service: ServiceKind) -> anyhow::Result<()> {
        let url = service
            .browser_url()
            .with_context(|| format!("{service} has no web interface"))?;

        Command::new("rundll32")
            .args(["url.dll,FileProtocolHandler", url])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to open {url}"))?;
        Ok(())
    }

    fn package_artifacts(&self, config: &LauncherConfig) -> Vec<Artifact> {
        let es_version = &config.elasticsearch_version;
        let camunda_version = &config.camunda_version;
        vec![
            Artifact {
                url: format!(
                    "https://artifacts.elastic.co/downloads/elasticsearch/elasticsearch-{es_version}-windows-x86_64.zip"
                ),
                file_name: format!("elasticsearch-{es_version}.zip"),
                unpacked_dir: Some(format!("elasticsearch-{es_version}")),
            },
            Artifact {
                url: format!(
                    "https://github.com/camunda/camunda/releases/download/{camunda_version}/camunda-zeebe-{camunda_version}.zip"
                ),
                file_name: format!("camunda-zeebe-{camunda_version}.zip"),
                unpacked_dir: Some(format!("camunda-zeebe-{camunda_version}")),
            },
            connectors_artifact(config),
        ]
    }

    fn extract_command(&self, archive: &Path, dest: &Path) -> ToolCommand {
        ToolCommand::new(
            "tar",
            [
                "-xf".to_string(),
                archive.display().to_string(),
                "-C".to_string(),
                dest.display().to_string(),
            ],
        )
    }

    fn bundle(&self, config: &LauncherConfig) -> Bundle {
        let archive = config.base_dir.join(format!(
            "camunda8-run-{}-windows-{}.zip",
            config.camunda_version,
            std::env::consts::ARCH,
        ));
        // bsdtar picks the zip format from the extension with -a
        let mut args = vec!["-a".to_string(), "-cf".to_string(), archive.display().to_string()];
        args.extend(bundle_entries(config, "c8run.exe"));

        Bundle {
            command: ToolCommand::new("tar", args).in_dir(config.base_dir.clone()),
            archive,
        }
    }
}
