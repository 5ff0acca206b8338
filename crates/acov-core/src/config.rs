use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub projects: Vec<ProjectConfig>,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub tools: ToolConfig,
    #[serde(default)]
    pub diff_failure_policy: DiffFailurePolicy,
    #[serde(default)]
    pub include_external_sources: bool,
}

/// One registered source tree, optionally paired with its previous revision.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectConfig {
    pub new_dir: PathBuf,
    #[serde(default)]
    pub old_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolConfig {
    #[serde(default = "default_gcov")]
    pub gcov: String,
    #[serde(default = "default_diff")]
    pub diff: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// What to do when the old/new diff of a file cannot be computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffFailurePolicy {
    /// Log, count, and treat the whole file as new.
    #[default]
    TreatAsNew,
    /// Drop the report for that file.
    Fail,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("html")
}

fn default_gcov() -> String {
    "gcov".to_string()
}

fn default_diff() -> String {
    "diff".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            ignore_patterns: Vec::new(),
            output_dir: default_output_dir(),
            tools: ToolConfig::default(),
            diff_failure_policy: DiffFailurePolicy::default(),
            include_external_sources: false,
        }
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            gcov: default_gcov(),
            diff: default_diff(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ToolConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ProjectConfig {
    pub fn new(new_dir: impl Into<PathBuf>, old_dir: Option<PathBuf>) -> Self {
        Self {
            new_dir: new_dir.into(),
            old_dir,
        }
    }
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Acov").required(false))
        .add_source(Environment::with_prefix("ACOV").separator("__"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
