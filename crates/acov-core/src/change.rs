//! Classifying lines of a file as new or changed against a previous revision.

use crate::error::Error;
use crate::tool;
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{trace, warn};

/// Produces the 1-based line numbers of `new_file` that were added or
/// changed relative to `old_file`, along with how many hunk headers could
/// not be parsed.
pub trait ChangeClassifier {
    fn classify(&self, old_file: &Path, new_file: &Path) -> Result<ParsedDiff, Error>;
}

/// Kind of a normal-format diff hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunkOp {
    Add,
    Change,
    Delete,
}

/// One hunk header of normal-format diff output, e.g. `3,4c3,5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffHunk {
    pub op: HunkOp,
    pub old_start: u32,
    pub old_end: u32,
    pub new_start: u32,
    pub new_end: u32,
}

/// Lines picked up from diff output, plus how many hunk headers were rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDiff {
    pub new_lines: BTreeSet<u32>,
    pub malformed_hunks: usize,
}

fn hunk_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+)(?:,(\d+))?([acd])(\d+)(?:,(\d+))?\s*$").expect("valid hunk regex")
    })
}

/// Parse one diff output line. Returns `None` for anything that is not a
/// hunk header (hunk bodies, `---` separators).
pub fn parse_hunk_header(line: &str) -> Option<Result<DiffHunk, String>> {
    let caps = hunk_regex().captures(line)?;
    let number = |idx: usize| caps.get(idx).map(|m| m.as_str().parse::<u32>());

    let parsed = (|| {
        let old_start = number(1).transpose().ok()??;
        let old_end = number(2).transpose().ok()?.unwrap_or(old_start);
        let new_start = number(4).transpose().ok()??;
        let new_end = number(5).transpose().ok()?.unwrap_or(new_start);
        Some((old_start, old_end, new_start, new_end))
    })();
    let Some((old_start, old_end, new_start, new_end)) = parsed else {
        return Some(Err(format!("number out of range in '{}'", line)));
    };

    let op = match &caps[3] {
        "a" => HunkOp::Add,
        "c" => HunkOp::Change,
        _ => HunkOp::Delete,
    };

    // An add/change always lands on real new-file lines. Old anchor 0
    // (insertion before the first line) is legal.
    if op != HunkOp::Delete && new_start == 0 {
        return Some(Err(format!("new range starts at line 0 in '{}'", line)));
    }
    if new_end < new_start || old_end < old_start {
        return Some(Err(format!("reversed range in '{}'", line)));
    }

    Some(Ok(DiffHunk {
        op,
        old_start,
        old_end,
        new_start,
        new_end,
    }))
}

/// Collect every new-file line covered by an add or change hunk.
pub fn parse_diff_output(output: &str) -> ParsedDiff {
    let mut parsed = ParsedDiff::default();
    for line in output.lines() {
        match parse_hunk_header(line) {
            None => {}
            Some(Ok(hunk)) => {
                trace!("diff hunk {:?}", hunk);
                if hunk.op != HunkOp::Delete {
                    parsed.new_lines.extend(hunk.new_start..=hunk.new_end);
                }
            }
            Some(Err(reason)) => {
                warn!("Skipping malformed diff hunk: {}", reason);
                parsed.malformed_hunks += 1;
            }
        }
    }
    parsed
}

/// Strip carriage returns so line-ending-only edits never count as changes.
pub fn normalize_line_endings(content: &[u8]) -> Vec<u8> {
    content.iter().copied().filter(|&b| b != b'\r').collect()
}

/// Classifier backed by an external normal-format `diff` program.
#[derive(Debug, Clone)]
pub struct DiffClassifier {
    program: String,
    timeout: Duration,
}

impl DiffClassifier {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl ChangeClassifier for DiffClassifier {
    fn classify(&self, old_file: &Path, new_file: &Path) -> Result<ParsedDiff, Error> {
        let old_scratch = normalized_copy(old_file)?;
        let new_scratch = normalized_copy(new_file)?;

        let output = tool::run(
            &self.program,
            [old_scratch.path(), new_scratch.path()],
            None,
            self.timeout,
        )?;

        // diff: 0 = identical, 1 = different, anything else is trouble
        match output.status.code() {
            Some(0) | Some(1) => {}
            _ => {
                return Err(Error::ToolFailed {
                    program: self.program.clone(),
                    status: output.status,
                    stderr: output.stderr.trim().to_string(),
                })
            }
        }

        Ok(parse_diff_output(&output.stdout))
    }
}

/// Copy `path` into a uniquely named scratch file with normalized line endings.
fn normalized_copy(path: &Path) -> Result<NamedTempFile, Error> {
    let content = fs::read(path).map_err(|e| Error::file_access(path, e))?;
    let mut scratch = NamedTempFile::new()?;
    scratch.write_all(&normalize_line_endings(&content))?;
    scratch.flush()?;
    Ok(scratch)
}
