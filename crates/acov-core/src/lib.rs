pub mod change;
pub mod config;
pub mod engine;
pub mod error;
pub mod gcov;
pub mod index;
pub mod paths;
pub mod progress;
pub mod render;
pub mod report;
pub mod scanner;
pub mod tool;

pub use config::{AppConfig, DiffFailurePolicy, ProjectConfig};
pub use engine::{CoverageEngine, CoverageRun, RunContext, RunDiagnostics};
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
pub use report::{FileReport, LineState, NewLines, ReportSet};
