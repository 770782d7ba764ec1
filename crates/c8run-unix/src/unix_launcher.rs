#[cfg(unix)]
mod unix_impl {
    use anyhow::Context;
    use async_trait::async_trait;
    use c8run_core::platform::{bundle_entries, connectors_artifact};
    use c8run_core::{
        Artifact, Bundle, LauncherConfig, LauncherError, PlatformLauncher, ProcessId,
        ServiceCommand, ServiceKind, TerminationResult, ToolCommand, tree,
    };
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid as NixPid;
    use std::path::{Path, PathBuf};
    use std::process::Stdio;
    use std::sync::{Mutex, PoisonError};
    use sysinfo::System;
    use tokio::process::Command;
    use tracing::{debug, info, warn};

    /// Unix launcher: shell launch scripts, signals and `/proc`-style process tables
    pub struct UnixLauncher {
        system: Mutex<System>,
    }

    impl Default for UnixLauncher {
        fn default() -> Self {
            Self::new()
        }
    }

    impl UnixLauncher {
        pub fn new() -> Self {
            info!("Initializing Unix launcher with system monitoring");
            Self {
                system: Mutex::new(System::new()),
            }
        }

        /// Whether `pid` names a running (non-zombie) process
        #[cfg(test)]
        pub(crate) fn is_alive(&self, pid: ProcessId) -> bool {
            let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
            tree::refresh(&mut system);
            tree::is_alive(&system, pid)
        }

        fn os_name() -> &'static str {
            if cfg!(target_os = "macos") {
                "darwin"
            } else {
                "linux"
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
    }

    #[async_trait]
    impl PlatformLauncher for UnixLauncher {
        fn platform_name(&self) -> &'static str {
            "unix"
        }

        fn java_binary(&self, java_home: Option<&Path>) -> PathBuf {
            match java_home {
                Some(home) => home.join("bin").join("java"),
                None => PathBuf::from("java"),
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
                    Self::require_file(config.elasticsearch_dir().join("bin").join("elasticsearch"))?,
                    vec![
                        "-E".to_string(),
                        "xpack.ml.enabled=false".to_string(),
                        "-E".to_string(),
                        "xpack.security.enabled=false".to_string(),
                    ],
                ),
                ServiceKind::ConnectorRuntime => {
                    let classpath = format!(
                        "{base}/*:{base}/custom_connectors/*:{camunda}/lib/*",
                        base = base.display(),
                        camunda = config.camunda_dir().display(),
                    );
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
                    Self::require_file(config.camunda_dir().join("bin").join("camunda"))?,
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

            // Keep terminal signals aimed at the launcher away from detached services
            if detached {
                cmd.process_group(0);
            }

            let child = cmd.spawn().map_err(|source| LauncherError::SpawnFailed {
                service: command.service,
                source,
            })?;

            let pid = child.id().map(ProcessId).ok_or_else(|| LauncherError::SpawnFailed {
                service: command.service,
                source: std::io::Error::other("process exited before its pid was read"),
            })?;

            info!(
                pid = %pid,
                program = %command.program.display(),
                args = ?command.args,
                "Spawned {}", command.service
            );
            Ok(pid)
        }

        async fn process_tree(&self, root: ProcessId) -> Vec<ProcessId> {
            let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
            tree::refresh(&mut system);
            let processes = tree::process_tree(&system, root);
            debug!(root = %root, count = processes.len(), "Resolved process tree");
            processes
        }

        async fn kill(&self, pid: ProcessId) -> TerminationResult {
            // 0 and values past i32::MAX would address process groups
            let raw = match i32::try_from(pid.0) {
                Ok(raw) if raw > 0 => raw,
                _ => return TerminationResult::ProcessNotFound,
            };

            match signal::kill(NixPid::from_raw(raw), Signal::SIGKILL) {
                Ok(()) => {
                    info!(pid = %pid, "Sent SIGKILL to process");
                    TerminationResult::Success
                }
                Err(nix::errno::Errno::ESRCH) => {
                    debug!(pid = %pid, "Process not found (already terminated)");
                    TerminationResult::ProcessNotFound
                }
                Err(nix::errno::Errno::EPERM) => {
                    warn!(pid = %pid, "Permission denied to kill process");
                    TerminationResult::AccessDenied
                }
                Err(e) => TerminationResult::Failed(format!("SIGKILL failed: {e}")),
            }
        }

        async fn open_browser(&self, service: ServiceKind) -> anyhow::Result<()> {
            let url = service
                .browser_url()
                .with_context(|| format!("{service} has no web interface"))?;
            let opener = if cfg!(target_os = "macos") {
                "open"
            } else {
                "xdg-open"
            };

            Command::new(opener)
                .arg(url)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .with_context(|| format!("Failed to run {opener} {url}"))?;
            Ok(())
        }

        fn package_artifacts(&self, config: &LauncherConfig) -> Vec<Artifact> {
            let es_version = &config.elasticsearch_version;
            let camunda_version = &config.camunda_version;
            vec![
                Artifact {
                    url: format!(
                        "https://artifacts.elastic.co/downloads/elasticsearch/elasticsearch-{es_version}-{}-{}.tar.gz",
                        Self::os_name(),
                        std::env::consts::ARCH,
                    ),
                    file_name: format!("elasticsearch-{es_version}.tar.gz"),
                    unpacked_dir: Some(format!("elasticsearch-{es_version}")),
                },
                Artifact {
                    url: format!(
                        "https://github.com/camunda/camunda/releases/download/{camunda_version}/camunda-zeebe-{camunda_version}.tar.gz"
                    ),
                    file_name: format!("camunda-zeebe-{camunda_version}.tar.gz"),
                    unpacked_dir: Some(format!("camunda-zeebe-{camunda_version}")),
                },
                connectors_artifact(config),
            ]
        }

        fn extract_command(&self, archive: &Path, dest: &Path) -> ToolCommand {
            ToolCommand::new(
                "tar",
                [
                    "-xzf".to_string(),
                    archive.display().to_string(),
                    "-C".to_string(),
                    dest.display().to_string(),
                ],
            )
        }

        fn bundle(&self, config: &LauncherConfig) -> Bundle {
            let archive = config.base_dir.join(format!(
                "camunda8-run-{}-{}-{}.tar.gz",
                config.camunda_version,
                Self::os_name(),
                std::env::consts::ARCH,
            ));
            let mut args = vec!["-czf".to_string(), archive.display().to_string()];
            args.extend(bundle_entries(config, "c8run"));

            Bundle {
                command: ToolCommand::new("tar", args).in_dir(config.base_dir.clone()),
                archive,
            }
        }
    }
}

// Re-export the Unix implementation when on Unix systems
#[cfg(unix)]
pub use unix_impl::UnixLauncher;

// Provide stub implementations for non-Unix systems
#[cfg(not(unix))]
pub struct UnixLauncher;

#[cfg(not(unix))]
impl UnixLauncher {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(unix))]
impl Default for UnixLauncher {
    fn default() -> Self {
        Self::new()
    }
}
