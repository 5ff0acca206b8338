use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "./logs/acov.log";

/// Where logs go and how much of them, resolved from `-v` and the
/// `TRACING_LEVEL` / `LOG_FILE_PATH` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    pub log_dir: PathBuf,
    pub log_file: PathBuf,
}

impl LogSettings {
    pub fn resolve(verbosity: u8, tracing_level: Option<String>, log_path: Option<String>) -> Self {
        // -v only opens up acov's own crates; dependencies stay at warn
        let filter = tracing_level.unwrap_or_else(|| match verbosity {
            0 => "info".to_string(),
            1 => "warn,acov=debug,acov_core=debug".to_string(),
            _ => "warn,acov=trace,acov_core=trace".to_string(),
        });

        let log_path = PathBuf::from(log_path.unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()));
        let log_dir = match log_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let log_file = log_path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("acov.log"));

        Self {
            filter,
            log_dir,
            log_file,
        }
    }

    fn from_env(verbosity: u8) -> Self {
        Self::resolve(
            verbosity,
            env::var("TRACING_LEVEL").ok(),
            env::var("LOG_FILE_PATH").ok(),
        )
    }
}

/// Console logs go to stderr so report listings on stdout stay clean. The
/// returned guard flushes the file writer when dropped.
pub fn init_logger(verbosity: u8) -> impl Drop {
    let settings = LogSettings::from_env(verbosity);
    let filter_layer = EnvFilter::new(&settings.filter);

    let file_appender = tracing_appender::rolling::never(&settings.log_dir, &settings.log_file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity > 0)
                .without_time()
                .with_ansi(true),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(filter_layer)
        .init();

    info!("Logging to {}", settings.log_dir.join(&settings.log_file).display());

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = LogSettings::resolve(0, None, None);
        assert_eq!(settings.filter, "info");
        assert_eq!(settings.log_dir, PathBuf::from("./logs"));
        assert_eq!(settings.log_file, PathBuf::from("acov.log"));
    }

    #[test]
    fn test_verbosity_scopes_to_own_crates() {
        let settings = LogSettings::resolve(1, None, None);
        assert!(settings.filter.starts_with("warn,"));
        assert!(settings.filter.contains("acov_core=debug"));
        assert!(LogSettings::resolve(3, None, None).filter.contains("acov_core=trace"));
    }

    #[test]
    fn test_tracing_level_overrides_verbosity() {
        let settings = LogSettings::resolve(2, Some("error".to_string()), None);
        assert_eq!(settings.filter, "error");
    }

    #[test]
    fn test_bare_file_name_logs_to_current_dir() {
        let settings = LogSettings::resolve(0, None, Some("run.log".to_string()));
        assert_eq!(settings.log_dir, PathBuf::from("."));
        assert_eq!(settings.log_file, PathBuf::from("run.log"));
    }
}
