//! Ordered start of the platform services and teardown of their process trees.

use c8run_core::config::REQUIRED_JAVA_MAJOR;
use c8run_core::{
    LauncherConfig, LauncherError, PlatformLauncher, ProcessId, ServiceKind, Settings,
    TerminationResult, java,
};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::health::{HealthGate, HealthProbe};

/// Starts and stops one local platform instance rooted at `config.base_dir`
pub struct Launcher<P> {
    platform: Arc<dyn PlatformLauncher>,
    gate: HealthGate<P>,
    config: LauncherConfig,
    settings: Settings,
}

impl<P: HealthProbe> Launcher<P> {
    pub fn new(
        platform: Arc<dyn PlatformLauncher>,
        probe: P,
        config: LauncherConfig,
        settings: Settings,
    ) -> Self {
        Self {
            platform,
            gate: HealthGate::new(probe),
            config,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Start Elasticsearch, Connectors and Camunda in order.
    ///
    /// Each stage only begins once the previous one succeeded. A failure
    /// aborts the sequence and leaves already started services running;
    /// `stop` cleans them up.
    pub async fn start(&self) -> Result<(), LauncherError> {
        self.preflight().await?;

        self.start_service(ServiceKind::SearchEngine, &[]).await?;
        self.await_ready(ServiceKind::SearchEngine).await?;
        info!("{} has successfully been started.", ServiceKind::SearchEngine);

        self.start_service(ServiceKind::ConnectorRuntime, &[]).await?;

        let config_location = [self.config.config_location_arg(&self.settings)];
        self.start_service(ServiceKind::WorkflowEngine, &config_location)
            .await?;
        self.await_ready(ServiceKind::WorkflowEngine).await?;
        info!("{} has successfully been started.", ServiceKind::WorkflowEngine);

        if let Err(e) = self.platform.open_browser(ServiceKind::WorkflowEngine).await {
            warn!(error = %e, "Failed to open the browser");
        }
        self.print_endpoints().await;
        Ok(())
    }

    /// Kill the process tree behind every marker file and delete the markers.
    ///
    /// Services are handled independently; the first hard error is returned
    /// after all of them were attempted.
    pub async fn stop(&self) -> Result<(), LauncherError> {
        let mut first_error = None;
        for service in ServiceKind::ALL {
            if let Err(e) = self.stop_service(service).await {
                warn!(service = %service, error = %e, "Failed to stop service");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn preflight(&self) -> Result<(), LauncherError> {
        let version = match &self.config.java_version {
            Some(version) => version.clone(),
            None => self.probe_java_version().await?,
        };
        info!("Java version is {version}");
        java::ensure_supported(&version, REQUIRED_JAVA_MAJOR)?;

        if let Some(opts) = &self.config.java_opts {
            info!("JAVA_OPTS: {opts}");
        }

        let log_dir = self.config.log_dir();
        tokio::fs::create_dir_all(&log_dir)
            .await
            .map_err(|source| LauncherError::FileOpen {
                path: log_dir,
                source,
            })
    }

    async fn probe_java_version(&self) -> Result<String, LauncherError> {
        let java = self.platform.java_binary(self.config.java_home.as_deref());
        let output = match self.platform.version_command(&java).to_command().output().await {
            Ok(output) => output,
            Err(e) => {
                debug!(java = %java.display(), error = %e, "Java version probe failed");
                return Err(LauncherError::JavaMissing {
                    required: REQUIRED_JAVA_MAJOR,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        java::version_from_probe_output(&stdout).map(str::to_string)
    }

    async fn start_service(
        &self,
        service: ServiceKind,
        extra_args: &[String],
    ) -> Result<ProcessId, LauncherError> {
        let command = self
            .platform
            .build_command(service, &self.config, extra_args)?;

        let log = tokio::fs::File::create(&command.log_file)
            .await
            .map_err(|source| LauncherError::FileOpen {
                path: command.log_file.clone(),
                source,
            })?
            .into_std()
            .await;

        let pid = self
            .platform
            .spawn(&command, log, self.settings.detached)
            .await?;
        info!(service = %service, "Process id {pid}");

        self.config.pid_file(service).write(pid).await?;
        Ok(pid)
    }

    async fn await_ready(&self, service: ServiceKind) -> Result<(), LauncherError> {
        if let Some(spec) = service.health_check() {
            self.gate.wait(&spec).await?;
        }
        Ok(())
    }

    async fn stop_service(&self, service: ServiceKind) -> Result<(), LauncherError> {
        let pid_file = self.config.pid_file(service);
        let pid = match pid_file.read().await {
            Ok(Some(pid)) => Some(pid),
            Ok(None) => return Ok(()),
            Err(e) if e.is_recoverable() => {
                debug!(service = %service, error = %e, "Ignoring unreadable marker file");
                None
            }
            Err(e) => return Err(e),
        };

        if let Some(pid) = pid {
            for member in self.platform.process_tree(pid).await {
                let result = self.platform.kill(member).await;
                if result != TerminationResult::Success {
                    warn!(service = %service, pid = %member, result = ?result, "Kill did not succeed");
                }
            }
        }

        pid_file.remove().await?;
        info!("{service} is stopped.");
        Ok(())
    }

    async fn print_endpoints(&self) {
        let path = self.config.endpoints_file();
        match tokio::fs::read_to_string(&path).await {
            Ok(endpoints) => {
                if let Err(e) = write_endpoints(&mut std::io::stdout().lock(), &endpoints) {
                    debug!(error = %e, "Failed to print endpoints");
                }
            }
            Err(e) => debug!(path = %path.display(), error = %e, "No endpoints file to print"),
        }
    }
}

/// Copy the endpoint listing to `out` and flush it so it shows before exit
fn write_endpoints(out: &mut impl Write, endpoints: &str) -> std::io::Result<()> {
    out.write_all(endpoints.as_bytes())?;
    out.flush()
}
