use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Cannot access file {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start '{program}': {source}")]
    ToolSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("External tool '{program}' timed out after {}s", timeout.as_secs())]
    ToolTimeout { program: String, timeout: Duration },

    #[error("External tool '{program}' exited with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("No project directories registered")]
    NoProjects,
}

impl Error {
    pub(crate) fn file_access(path: &std::path::Path, source: std::io::Error) -> Self {
        Error::FileAccess {
            path: path.to_path_buf(),
            source,
        }
    }
}
