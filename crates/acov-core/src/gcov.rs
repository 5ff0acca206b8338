//! The coverage tool boundary: invoking gcov and reading what it produces.
//!
//! Only two textual surfaces are consumed: the "creating" announcements on
//! the tool's stdout, and the per-line `count:line:text` records of each
//! generated data file.

use crate::error::Error;
use crate::tool;
use regex::Regex;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{trace, warn};

/// Runs the coverage tool for one build artifact.
pub trait CoverageTool {
    /// Analyze `artifact` with `working_dir` as both the process working
    /// directory and the graph search directory. Data files are written into
    /// `working_dir`; the tool's stdout is returned.
    fn analyze(&self, artifact: &Path, working_dir: &Path) -> Result<String, Error>;
}

#[derive(Debug, Clone)]
pub struct Gcov {
    program: String,
    timeout: Duration,
}

impl Gcov {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl CoverageTool for Gcov {
    fn analyze(&self, artifact: &Path, working_dir: &Path) -> Result<String, Error> {
        let output = tool::run(
            &self.program,
            [OsStr::new("-o"), working_dir.as_os_str(), artifact.as_os_str()],
            Some(working_dir),
            self.timeout,
        )?;
        if !output.status.success() {
            return Err(Error::ToolFailed {
                program: self.program.clone(),
                status: output.status,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

/// A data file the tool announced, with the source it describes as the
/// tool spelled it (possibly relative to the working directory).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedDataFile {
    pub source: PathBuf,
    pub data_file: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolAnnouncements {
    pub created: Vec<CreatedDataFile>,
    /// Non-empty lines that were neither an announcement nor a `File` header.
    pub unmatched_lines: usize,
}

fn creating_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.*):creating '(.*)'$").expect("valid creating regex"))
}

fn bare_creating_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Creating '(.*)'$").expect("valid creating regex"))
}

fn file_header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^File '(.*)'$").expect("valid file regex"))
}

/// Parse the coverage tool's stdout.
///
/// Older gcov announces `src.c:creating 'src.c.gcov'`. Newer releases print
/// `File 'src.c'` followed later by `Creating 'src.c.gcov'`, so the last
/// `File` header supplies the source for a bare announcement.
pub fn parse_tool_output(stdout: &str) -> ToolAnnouncements {
    let mut announcements = ToolAnnouncements::default();
    let mut current_source: Option<PathBuf> = None;

    for line in stdout.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }
        if let Some(caps) = creating_regex().captures(line) {
            announcements.created.push(CreatedDataFile {
                source: PathBuf::from(&caps[1]),
                data_file: PathBuf::from(&caps[2]),
            });
        } else if let Some(caps) = file_header_regex().captures(line) {
            current_source = Some(PathBuf::from(&caps[1]));
        } else if let Some(caps) = bare_creating_regex().captures(line) {
            match &current_source {
                Some(source) => announcements.created.push(CreatedDataFile {
                    source: source.clone(),
                    data_file: PathBuf::from(&caps[1]),
                }),
                None => {
                    warn!("Data file announced without a source: {}", line);
                    announcements.unmatched_lines += 1;
                }
            }
        } else {
            trace!("Ignoring tool output: {}", line);
            announcements.unmatched_lines += 1;
        }
    }

    announcements
}

/// The execution-count field of one data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountToken {
    Executed(u64),
    /// Instrumented code that never ran.
    NotExecuted,
    /// No code on this line.
    NonExecutable,
}

pub fn parse_count_token(token: &str) -> Option<CountToken> {
    match token.trim() {
        "-" => Some(CountToken::NonExecutable),
        // `=====` marks blocks reached only through exceptions
        "#####" | "=====" => Some(CountToken::NotExecuted),
        other => other
            .trim_end_matches('*')
            .parse::<u64>()
            .ok()
            .map(CountToken::Executed),
    }
}

/// One (line, count) observation from a data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSample {
    pub line: u32,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDataFile {
    pub samples: Vec<LineSample>,
    pub non_executable: usize,
    pub malformed_records: usize,
}

fn record_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([^:]*):([^:]*):(.*)").expect("valid record regex"))
}

/// Parse a generated per-line data file into samples.
///
/// Non-executable lines produce no sample, never-executed lines produce a
/// zero-count sample, and records with line number 0 (the data file's
/// preamble) are dropped.
pub fn parse_data_file(content: &str) -> ParsedDataFile {
    let mut parsed = ParsedDataFile::default();

    for record in content.lines() {
        let Some(caps) = record_regex().captures(record) else {
            warn!("Malformed coverage record: {:?}", record);
            parsed.malformed_records += 1;
            continue;
        };

        let count = match parse_count_token(&caps[1]) {
            Some(CountToken::NonExecutable) => {
                parsed.non_executable += 1;
                continue;
            }
            Some(CountToken::NotExecuted) => 0,
            Some(CountToken::Executed(count)) => count,
            None => {
                warn!("Malformed execution count in record: {:?}", record);
                parsed.malformed_records += 1;
                continue;
            }
        };

        let line = match caps[2].trim().parse::<u32>() {
            Ok(line) => line,
            Err(_) => {
                warn!("Malformed line number in record: {:?}", record);
                parsed.malformed_records += 1;
                continue;
            }
        };
        if line == 0 {
            continue;
        }

        trace!("line {} count {}", line, count);
        parsed.samples.push(LineSample { line, count });
    }

    parsed
}
