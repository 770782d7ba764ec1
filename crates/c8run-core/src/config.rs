use derive_builder::Builder;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::pidfile::PidFile;
use crate::process::ServiceKind;

pub const DEFAULT_CAMUNDA_VERSION: &str = "8.6.2";
pub const DEFAULT_ELASTICSEARCH_VERSION: &str = "8.13.4";
pub const REQUIRED_JAVA_MAJOR: u32 = 21;

pub const CAMUNDA_VERSION_VAR: &str = "CAMUNDA_VERSION";
pub const JAVA_HOME_VAR: &str = "JAVA_HOME";
pub const JAVA_VERSION_VAR: &str = "JAVA_VERSION";
pub const JAVA_OPTS_VAR: &str = "JAVA_OPTS";

/// Environment handed to every managed process on top of the inherited one
pub fn default_environment() -> HashMap<String, String> {
    [
        (
            "ZEEBE_BROKER_EXPORTERS_ELASTICSEARCH_CLASSNAME",
            "io.camunda.zeebe.exporter.ElasticsearchExporter",
        ),
        (
            "ZEEBE_BROKER_EXPORTERS_ELASTICSEARCH_ARGS_URL",
            "http://localhost:9200",
        ),
        (
            "ZEEBE_BROKER_EXPORTERS_ELASTICSEARCH_ARGS_INDEX_PREFIX",
            "zeebe-record",
        ),
        ("CAMUNDA_REST_QUERY_ENABLED", "true"),
        ("CAMUNDA_OPERATE_CSRFPREVENTIONENABLED", "false"),
        ("CAMUNDA_TASKLIST_CSRFPREVENTIONENABLED", "false"),
        ("ES_JAVA_OPTS", "-Xms1g -Xmx1g"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Command line settings, fixed once parsed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Configuration location override, relative to the base directory
    pub config: Option<PathBuf>,
    /// Leave the services running and return once startup succeeds
    pub detached: bool,
}

/// Readiness check against an HTTP endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckSpec {
    pub name: String,
    pub url: String,
    /// Retries after the first attempt
    pub max_retries: u32,
    pub retry_interval: Duration,
}

impl HealthCheckSpec {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        max_retries: u32,
        retry_interval: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            max_retries,
            retry_interval,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Launcher configuration resolved from the environment
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(setter(into, strip_option))]
pub struct LauncherConfig {
    /// Distribution root; marker files, logs and unpacked services live here
    pub base_dir: PathBuf,
    #[builder(default = "DEFAULT_CAMUNDA_VERSION.to_string()")]
    pub camunda_version: String,
    #[builder(default = "DEFAULT_ELASTICSEARCH_VERSION.to_string()")]
    pub elasticsearch_version: String,
    #[builder(default)]
    pub java_home: Option<PathBuf>,
    /// Skips the version probe when set
    #[builder(default)]
    pub java_version: Option<String>,
    #[builder(default)]
    pub java_opts: Option<String>,
    #[builder(default = "default_environment()")]
    #[builder(setter(custom))]
    pub env: HashMap<String, String>,
}

impl LauncherConfig {
    pub fn builder() -> LauncherConfigBuilder {
        LauncherConfigBuilder::default()
    }

    /// Resolve the configuration from the process environment
    pub fn from_env(base_dir: impl Into<PathBuf>) -> Self {
        Self::from_lookup(base_dir, |key| std::env::var(key).ok())
    }

    /// Resolve the configuration through `lookup`; empty values count as unset
    pub fn from_lookup<F>(base_dir: impl Into<PathBuf>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            base_dir: base_dir.into(),
            camunda_version: var(CAMUNDA_VERSION_VAR)
                .unwrap_or_else(|| DEFAULT_CAMUNDA_VERSION.to_string()),
            elasticsearch_version: DEFAULT_ELASTICSEARCH_VERSION.to_string(),
            java_home: var(JAVA_HOME_VAR).map(PathBuf::from),
            java_version: var(JAVA_VERSION_VAR),
            java_opts: var(JAVA_OPTS_VAR),
            env: default_environment(),
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.base_dir.join("log")
    }

    pub fn log_file(&self, service: ServiceKind) -> PathBuf {
        self.log_dir().join(service.log_file_name())
    }

    pub fn pid_file(&self, service: ServiceKind) -> PidFile {
        PidFile::for_service(&self.base_dir, service)
    }

    pub fn endpoints_file(&self) -> PathBuf {
        self.base_dir.join("endpoints.txt")
    }

    pub fn elasticsearch_dir(&self) -> PathBuf {
        self.base_dir
            .join(format!("elasticsearch-{}", self.elasticsearch_version))
    }

    pub fn camunda_dir(&self) -> PathBuf {
        self.base_dir
            .join(format!("camunda-zeebe-{}", self.camunda_version))
    }

    pub fn connectors_jar_name(&self) -> String {
        format!(
            "connector-runtime-bundle-{}-with-dependencies.jar",
            self.camunda_version
        )
    }

    /// `--spring.config.location` argument for the workflow engine
    pub fn config_location_arg(&self, settings: &Settings) -> String {
        let location = match &settings.config {
            Some(config) => self.base_dir.join(config),
            None => self.base_dir.join("configuration"),
        };
        format!("--spring.config.location={}", location.display())
    }
}

impl LauncherConfigBuilder {
    pub fn env<T: ToString>(&mut self, key: T, value: T) -> &mut Self {
        let map = self.env.get_or_insert_with(default_environment);
        map.insert(key.to_string(), value.to_string());
        self
    }

    pub fn env_multi<T: ToString, I: IntoIterator<Item = (T, T)>>(&mut self, iter: I) -> &mut Self {
        let env = self.env.get_or_insert_with(default_environment);
        for (key, value) in iter {
            env.insert(key.to_string(), value.to_string());
        }
        self
    }
}
