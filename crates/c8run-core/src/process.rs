use derive_builder::Builder;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;
use tokio::process::Command;

use crate::config::HealthCheckSpec;

/// Operating-system process identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(pub u32);

impl From<u32> for ProcessId {
    fn from(pid: u32) -> Self {
        ProcessId(pid)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProcessId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(ProcessId)
    }
}

/// Result of a process termination operation
#[derive(Debug, Clone, PartialEq)]
pub enum TerminationResult {
    /// Process was successfully terminated
    Success,
    /// Process was not found (already exited)
    ProcessNotFound,
    /// Insufficient privileges to signal the process
    AccessDenied,
    /// Operation failed with specific error message
    Failed(String),
}

impl TerminationResult {
    /// The process is gone, whether or not this call was the one that ended it
    pub fn is_terminated(&self) -> bool {
        matches!(
            self,
            TerminationResult::Success | TerminationResult::ProcessNotFound
        )
    }
}

/// The services making up one local platform instance, in start order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    SearchEngine,
    ConnectorRuntime,
    WorkflowEngine,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 3] = [
        ServiceKind::SearchEngine,
        ServiceKind::ConnectorRuntime,
        ServiceKind::WorkflowEngine,
    ];

    /// Human readable name used in operator messages
    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceKind::SearchEngine => "Elasticsearch",
            ServiceKind::ConnectorRuntime => "Connectors",
            ServiceKind::WorkflowEngine => "Camunda",
        }
    }

    /// Stem shared by the service's marker file and log file
    pub fn file_stem(&self) -> &'static str {
        match self {
            ServiceKind::SearchEngine => "elasticsearch",
            ServiceKind::ConnectorRuntime => "connectors",
            ServiceKind::WorkflowEngine => "camunda",
        }
    }

    pub fn pid_file_name(&self) -> String {
        format!("{}.pid", self.file_stem())
    }

    pub fn log_file_name(&self) -> String {
        format!("{}.log", self.file_stem())
    }

    /// Readiness check gating the next stage, if the service exposes one
    pub fn health_check(&self) -> Option<HealthCheckSpec> {
        match self {
            ServiceKind::SearchEngine => Some(HealthCheckSpec::new(
                self.display_name(),
                "http://localhost:9200/_cluster/health?wait_for_status=green\
                 &wait_for_active_shards=all&wait_for_no_initializing_shards=true&timeout=120s",
                12,
                Duration::from_secs(10),
            )),
            ServiceKind::ConnectorRuntime => None,
            ServiceKind::WorkflowEngine => Some(HealthCheckSpec::new(
                self.display_name(),
                "http://localhost:8080/operate/login",
                24,
                Duration::from_secs(14),
            )),
        }
    }

    /// Page opened in the browser once the service is ready
    pub fn browser_url(&self) -> Option<&'static str> {
        match self {
            ServiceKind::WorkflowEngine => Some("http://localhost:8080/operate"),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Runnable command descriptor for one managed service
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(setter(into, strip_option))]
pub struct ServiceCommand {
    pub service: ServiceKind,
    pub program: PathBuf,
    #[builder(default)]
    #[builder(setter(custom))]
    pub args: Vec<String>,
    #[builder(default)]
    #[builder(setter(custom))]
    pub env: HashMap<String, String>,
    #[builder(default)]
    pub working_directory: Option<PathBuf>,
    pub log_file: PathBuf,
}

impl ServiceCommand {
    pub fn builder() -> ServiceCommandBuilder {
        ServiceCommandBuilder::default()
    }

    /// Base tokio command with arguments, environment and working directory applied.
    /// Output redirection and OS-specific flags are left to the platform launcher.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).envs(&self.env).stdin(Stdio::null());
        if let Some(dir) = &self.working_directory {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl ServiceCommandBuilder {
    pub fn args<S: ToString, I: IntoIterator<Item = S>>(&mut self, iter: I) -> &mut Self {
        let args: Vec<String> = iter.into_iter().map(|s| s.to_string()).collect();
        self.args = Some(args);
        self
    }

    pub fn env<T: ToString>(&mut self, key: T, value: T) -> &mut Self {
        let map = self.env.get_or_insert_with(HashMap::new);
        map.insert(key.to_string(), value.to_string());
        self
    }

    pub fn env_multi<K: ToString, V: ToString, I: IntoIterator<Item = (K, V)>>(
        &mut self,
        iter: I,
    ) -> &mut Self {
        let env = self.env.get_or_insert_with(HashMap::new);
        for (key, value) in iter {
            env.insert(key.to_string(), value.to_string());
        }
        self
    }
}

/// Auxiliary tool invocation (version probe, archive tools, browser opener)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_directory: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new<S: ToString, I: IntoIterator<Item = S>>(program: impl ToString, args: I) -> Self {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(|s| s.to_string()).collect(),
            working_directory: None,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).stdin(Stdio::null());
        if let Some(dir) = &self.working_directory {
            cmd.current_dir(dir);
        }
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_id_parsing() {
        assert_eq!("1234".parse::<ProcessId>().unwrap(), ProcessId(1234));
        assert_eq!(" 42\n".parse::<ProcessId>().unwrap(), ProcessId(42));
        assert!("".parse::<ProcessId>().is_err());
        assert!("-1".parse::<ProcessId>().is_err());
        assert!("12ab".parse::<ProcessId>().is_err());
        assert_eq!(ProcessId(u32::MAX).to_string(), u32::MAX.to_string());
    }

    #[test]
    fn test_service_files() {
        assert_eq!(ServiceKind::SearchEngine.pid_file_name(), "elasticsearch.pid");
        assert_eq!(ServiceKind::ConnectorRuntime.pid_file_name(), "connectors.pid");
        assert_eq!(ServiceKind::WorkflowEngine.log_file_name(), "camunda.log");
    }

    #[test]
    fn test_health_checks() {
        let search = ServiceKind::SearchEngine.health_check().unwrap();
        assert_eq!(search.max_attempts(), 13);
        assert_eq!(search.retry_interval, Duration::from_secs(10));
        assert!(search.url.contains("wait_for_status=green"));
        assert!(search.url.contains("wait_for_no_initializing_shards=true"));
        assert!(search.url.ends_with("timeout=120s"));

        assert!(ServiceKind::ConnectorRuntime.health_check().is_none());

        let camunda = ServiceKind::WorkflowEngine.health_check().unwrap();
        assert_eq!(camunda.max_attempts(), 25);
        assert_eq!(camunda.retry_interval, Duration::from_secs(14));
        assert_eq!(camunda.url, "http://localhost:8080/operate/login");
    }

    #[test]
    fn test_service_command_builder() {
        let command = ServiceCommand::builder()
            .service(ServiceKind::WorkflowEngine)
            .program("/opt/c8run/camunda-zeebe-8.6.2/bin/camunda")
            .args(["--spring.config.location=/opt/c8run/configuration"])
            .env("CAMUNDA_REST_QUERY_ENABLED", "true")
            .env_multi([("A", "1"), ("B", "2")])
            .working_directory("/opt/c8run")
            .log_file("/opt/c8run/log/camunda.log")
            .build()
            .unwrap();

        assert_eq!(command.args.len(), 1);
        assert_eq!(command.env.len(), 3);
        assert_eq!(command.working_directory, Some(PathBuf::from("/opt/c8run")));
    }

    #[test]
    fn test_service_command_requires_log_file() {
        let result = ServiceCommand::builder()
            .service(ServiceKind::SearchEngine)
            .program("elasticsearch")
            .build();
        assert!(result.is_err());
    }
}
