//! Running external tools with a bounded wall-clock time.

use crate::error::Error;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Run `program` with `args`, waiting at most `timeout`.
///
/// Output goes to anonymous temp files rather than pipes, so a chatty child
/// can never block on a full pipe while we poll it. On timeout the child is
/// killed and reaped before `Error::ToolTimeout` is returned.
pub fn run<I, S>(
    program: &str,
    args: I,
    working_dir: Option<&Path>,
    timeout: Duration,
) -> Result<ToolOutput, Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut stdout_file = tempfile::tempfile()?;
    let mut stderr_file = tempfile::tempfile()?;

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_file.try_clone()?))
        .stderr(Stdio::from(stderr_file.try_clone()?));
    if let Some(dir) = working_dir {
        command.current_dir(dir);
    }
    debug!("Running {:?}", command);

    let mut child = command.spawn().map_err(|source| Error::ToolSpawn {
        program: program.to_string(),
        source,
    })?;

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            warn!("'{}' exceeded {}s, killing it", program, timeout.as_secs());
            // the child may have exited between try_wait and kill
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::ToolTimeout {
                program: program.to_string(),
                timeout,
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    Ok(ToolOutput {
        status,
        stdout: read_back(&mut stdout_file)?,
        stderr: read_back(&mut stderr_file)?,
    })
}

fn read_back(file: &mut File) -> std::io::Result<String> {
    file.seek(SeekFrom::Start(0))?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_captures_stdout_and_status() {
        let output = run("sh", ["-c", "echo hello; echo oops >&2"], None, Duration::from_secs(10)).unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout, "hello\n");
        assert_eq!(output.stderr, "oops\n");
    }

    #[test]
    fn test_non_zero_exit_is_returned() {
        let output = run("sh", ["-c", "exit 3"], None, Duration::from_secs(10)).unwrap();
        assert_eq!(output.status.code(), Some(3));
    }

    #[test]
    fn test_working_directory() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("marker.txt"), "").unwrap();
        let output = run("sh", ["-c", "ls"], Some(tmp.path()), Duration::from_secs(10)).unwrap();
        assert!(output.stdout.contains("marker.txt"));
    }

    #[test]
    fn test_timeout_kills_child() {
        let started = Instant::now();
        let err = run("sh", ["-c", "sleep 30"], None, Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, Error::ToolTimeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_missing_program() {
        let err = run("acov-no-such-tool", Vec::<&str>::new(), None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, Error::ToolSpawn { .. }));
    }
}
