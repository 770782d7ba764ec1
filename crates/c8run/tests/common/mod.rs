#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use c8run::{
    Artifact, Bundle, HealthProbe, LauncherConfig, LauncherError, PlatformLauncher, ProcessId,
    ServiceCommand, ServiceKind, TerminationResult, ToolCommand,
};
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Records every call instead of touching real processes
pub struct FakePlatform {
    pub spawned: Mutex<Vec<ServiceCommand>>,
    pub killed: Mutex<Vec<ProcessId>>,
    /// Process tree reported per root pid; unknown roots are dead
    pub trees: Mutex<HashMap<ProcessId, Vec<ProcessId>>>,
    pub next_pid: AtomicU32,
    pub browser_opened: AtomicBool,
    pub artifacts: Vec<Artifact>,
    pub bundle_script: String,
    /// `build_command` fails for this service
    pub missing_executable: Option<ServiceKind>,
    /// `spawn` fails for this service
    pub spawn_failure: Option<ServiceKind>,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self {
            spawned: Mutex::new(Vec::new()),
            killed: Mutex::new(Vec::new()),
            trees: Mutex::new(HashMap::new()),
            next_pid: AtomicU32::new(4000),
            browser_opened: AtomicBool::new(false),
            artifacts: Vec::new(),
            bundle_script: "exit 0".to_string(),
            missing_executable: None,
            spawn_failure: None,
        }
    }
}

impl FakePlatform {
    pub fn with_tree(self, root: u32, tree: &[u32]) -> Self {
        self.trees
            .lock()
            .unwrap()
            .insert(ProcessId(root), tree.iter().copied().map(ProcessId).collect());
        self
    }

    pub fn spawned(&self) -> Vec<ServiceCommand> {
        self.spawned.lock().unwrap().clone()
    }

    pub fn killed(&self) -> Vec<ProcessId> {
        self.killed.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlatformLauncher for FakePlatform {
    fn platform_name(&self) -> &'static str {
        "fake"
    }

    fn java_binary(&self, java_home: Option<&Path>) -> PathBuf {
        java_home.map_or_else(|| PathBuf::from("java"), |home| home.join("bin/java"))
    }

    // run through sh so stub scripts need no exec bit
    fn version_command(&self, java: &Path) -> ToolCommand {
        ToolCommand::new("sh", [java.display().to_string(), "--version".to_string()])
    }

    fn build_command(
        &self,
        service: ServiceKind,
        config: &LauncherConfig,
        extra_args: &[String],
    ) -> Result<ServiceCommand, LauncherError> {
        if self.missing_executable == Some(service) {
            return Err(LauncherError::MissingExecutable(
                config.base_dir.join(format!("bin/{}", service.file_stem())),
            ));
        }
        Ok(ServiceCommand::builder()
            .service(service)
            .program(format!("fake-{}", service.file_stem()))
            .args(extra_args)
            .env_multi(config.env.clone())
            .working_directory(config.base_dir.clone())
            .log_file(config.log_file(service))
            .build()
            .unwrap())
    }

    async fn spawn(
        &self,
        command: &ServiceCommand,
        _log: std::fs::File,
        _detached: bool,
    ) -> Result<ProcessId, LauncherError> {
        if self.spawn_failure == Some(command.service) {
            return Err(LauncherError::SpawnFailed {
                service: command.service,
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }
        self.spawned.lock().unwrap().push(command.clone());
        Ok(ProcessId(self.next_pid.fetch_add(1, Ordering::Relaxed)))
    }

    async fn process_tree(&self, root: ProcessId) -> Vec<ProcessId> {
        self.trees
            .lock()
            .unwrap()
            .get(&root)
            .cloned()
            .unwrap_or_default()
    }

    async fn kill(&self, pid: ProcessId) -> TerminationResult {
        self.killed.lock().unwrap().push(pid);
        TerminationResult::Success
    }

    async fn open_browser(&self, _service: ServiceKind) -> Result<()> {
        self.browser_opened.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn package_artifacts(&self, _config: &LauncherConfig) -> Vec<Artifact> {
        self.artifacts.clone()
    }

    fn extract_command(&self, archive: &Path, dest: &Path) -> ToolCommand {
        // unpack "<name>.tar.gz" into "<dest>/<name>"
        let name = archive
            .file_name()
            .map(|n| n.to_string_lossy().trim_end_matches(".tar.gz").to_string())
            .unwrap_or_default();
        ToolCommand::new("sh", ["-c".to_string(), format!("mkdir -p '{}'", dest.join(name).display())])
    }

    fn bundle(&self, config: &LauncherConfig) -> Bundle {
        let archive = config.base_dir.join("bundle.tar.gz");
        Bundle {
            command: ToolCommand::new("sh", ["-c", self.bundle_script.as_str()])
                .in_dir(config.base_dir.clone()),
            archive,
        }
    }
}

/// Replays scripted statuses, then answers 200
pub struct FakeProbe {
    script: Mutex<VecDeque<u16>>,
    pub calls: AtomicU32,
}

impl FakeProbe {
    pub fn healthy() -> Self {
        Self::scripted([])
    }

    pub fn scripted(statuses: impl IntoIterator<Item = u16>) -> Self {
        Self {
            script: Mutex::new(statuses.into_iter().collect()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self::scripted(std::iter::repeat_n(503, 1000))
    }
}

#[async_trait]
impl HealthProbe for FakeProbe {
    async fn status(&self, _url: &str) -> Result<u16> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.script.lock().unwrap().pop_front().unwrap_or(200))
    }
}

/// Writes a `java` stub under `<base>/jdk` that prints `banner` and
/// returns a config that has to ask it for the version
pub fn config_with_java_stub(base: &Path, banner: &str) -> LauncherConfig {
    let java_home = base.join("jdk");
    std::fs::create_dir_all(java_home.join("bin")).unwrap();
    let script = if banner.is_empty() {
        String::new()
    } else {
        format!("echo '{banner}'\n")
    };
    std::fs::write(java_home.join("bin/java"), script).unwrap();

    LauncherConfig::builder()
        .base_dir(base)
        .java_home(java_home)
        .build()
        .unwrap()
}

/// Captures formatted log lines for assertions
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Route this thread's logs into a fresh capture until the guard drops
pub fn capture_logs() -> (LogCapture, tracing::subscriber::DefaultGuard) {
    let capture = LogCapture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .finish();
    (capture, tracing::subscriber::set_default(subscriber))
}

pub fn config_for(base: &Path) -> LauncherConfig {
    LauncherConfig::builder()
        .base_dir(base)
        .java_version("21.0.2")
        .build()
        .unwrap()
}
