use acov_core::{AppConfig, DiffFailurePolicy, ProjectConfig};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "acov")]
#[command(about = "Line coverage reports that tell new code from old", long_about = None)]
pub struct Cli {
    /// Raise log verbosity (-v debug, -vv trace); TRACING_LEVEL wins when set
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run coverage analysis over every project and write HTML reports
    Run(RunArgs),
    /// Index project directories and print per-category file counts
    Index(ProjectArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct ProjectArgs {
    /// Project directory, optionally paired with its previous revision
    #[arg(short, long = "project", value_name = "NEW[=OLD]", value_parser = parse_project)]
    pub projects: Vec<ProjectConfig>,

    /// Glob of paths to leave out of the index (repeatable)
    #[arg(long = "ignore", value_name = "GLOB")]
    pub ignore_patterns: Vec<String>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub project_args: ProjectArgs,

    /// Directory for the HTML reports
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Coverage tool to run
    #[arg(long)]
    pub gcov: Option<String>,

    /// Line diff tool to run
    #[arg(long)]
    pub diff: Option<String>,

    /// Seconds before an external tool is killed
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Drop a file's report when its diff fails instead of treating it as new
    #[arg(long)]
    pub strict_diff: bool,

    /// Report sources outside every project directory too
    #[arg(long)]
    pub include_external: bool,
}

fn parse_project(value: &str) -> Result<ProjectConfig, String> {
    let (new_dir, old_dir) = match value.split_once('=') {
        Some((new_dir, old_dir)) => (new_dir, Some(old_dir)),
        None => (value, None),
    };
    if new_dir.is_empty() || old_dir.is_some_and(str::is_empty) {
        return Err(format!("expected NEW or NEW=OLD, got '{}'", value));
    }
    Ok(ProjectConfig::new(new_dir, old_dir.map(PathBuf::from)))
}

impl ProjectArgs {
    /// Projects on the command line replace configured ones; ignore globs add up.
    pub fn apply(&self, config: &mut AppConfig) {
        if !self.projects.is_empty() {
            config.projects = self.projects.clone();
        }
        config
            .ignore_patterns
            .extend(self.ignore_patterns.iter().cloned());
    }
}

impl RunArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        self.project_args.apply(config);
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(gcov) = &self.gcov {
            config.tools.gcov = gcov.clone();
        }
        if let Some(diff) = &self.diff {
            config.tools.diff = diff.clone();
        }
        if let Some(timeout) = self.timeout {
            config.tools.timeout_secs = timeout;
        }
        if self.strict_diff {
            config.diff_failure_policy = DiffFailurePolicy::Fail;
        }
        if self.include_external {
            config.include_external_sources = true;
        }
    }
}
