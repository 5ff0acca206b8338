//! Per-source-file coverage model.

use crate::error::Error;
use crate::paths::path_key;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Which lines of the current file count as new.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewLines {
    /// No previous revision: every line is new.
    WholeFile,
    /// Lines added or changed relative to the previous revision.
    Changed(BTreeSet<u32>),
}

impl NewLines {
    pub fn contains(&self, line: u32) -> bool {
        match self {
            NewLines::WholeFile => true,
            NewLines::Changed(lines) => lines.contains(&line),
        }
    }

    pub fn is_whole_file(&self) -> bool {
        matches!(self, NewLines::WholeFile)
    }
}

/// Rendering classification of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    NonExecutable,
    CoveredOld,
    UncoveredOld,
    CoveredNew,
    UncoveredNew,
}

impl LineState {
    pub fn css_class(self) -> &'static str {
        match self {
            LineState::NonExecutable => "noexec",
            LineState::CoveredOld => "covered",
            LineState::UncoveredOld => "uncovered",
            LineState::CoveredNew => "covered_new",
            LineState::UncoveredNew => "uncovered_new",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileReport {
    new_path: PathBuf,
    old_path: Option<PathBuf>,
    /// line -> summed execution count; absent lines are not instrumented
    coverage: BTreeMap<u32, u64>,
    components: BTreeSet<String>,
    new_lines: NewLines,
}

impl FileReport {
    /// Report for a file with no previous revision. No diff is ever taken.
    pub fn new(new_path: impl Into<PathBuf>) -> Self {
        Self {
            new_path: new_path.into(),
            old_path: None,
            coverage: BTreeMap::new(),
            components: BTreeSet::new(),
            new_lines: NewLines::WholeFile,
        }
    }

    /// Report for a file with a previous revision, given the lines already
    /// classified as added or changed.
    pub fn with_old_file(
        new_path: impl Into<PathBuf>,
        old_path: impl Into<PathBuf>,
        changed: BTreeSet<u32>,
    ) -> Self {
        Self {
            new_path: new_path.into(),
            old_path: Some(old_path.into()),
            coverage: BTreeMap::new(),
            components: BTreeSet::new(),
            new_lines: NewLines::Changed(changed),
        }
    }

    /// Fold one coverage sample in. Counts for a line are summed across
    /// every contributing component.
    pub fn accumulate(&mut self, line: u32, count: u64, component: &str) {
        *self.coverage.entry(line).or_insert(0) += count;
        if !self.components.contains(component) {
            self.components.insert(component.to_string());
        }
    }

    pub fn new_path(&self) -> &Path {
        &self.new_path
    }

    pub fn old_path(&self) -> Option<&Path> {
        self.old_path.as_deref()
    }

    pub fn has_old_file(&self) -> bool {
        self.old_path.is_some()
    }

    pub fn coverage(&self) -> &BTreeMap<u32, u64> {
        &self.coverage
    }

    pub fn components(&self) -> &BTreeSet<String> {
        &self.components
    }

    pub fn new_lines(&self) -> &NewLines {
        &self.new_lines
    }

    pub fn is_fully_new(&self) -> bool {
        self.new_lines.is_whole_file()
    }

    pub fn line_state(&self, line: u32) -> LineState {
        let Some(&count) = self.coverage.get(&line) else {
            return LineState::NonExecutable;
        };
        match (count > 0, self.new_lines.contains(line)) {
            (true, true) => LineState::CoveredNew,
            (false, true) => LineState::UncoveredNew,
            (true, false) => LineState::CoveredOld,
            (false, false) => LineState::UncoveredOld,
        }
    }

    /// Number of lines with an entry in the coverage map.
    pub fn instrumented_lines(&self) -> usize {
        self.coverage.len()
    }

    pub fn covered_lines(&self) -> usize {
        self.coverage.values().filter(|&&count| count > 0).count()
    }

    /// Current text of the file, one entry per line, without terminators.
    pub fn source_lines(&self) -> Result<Vec<String>, Error> {
        let bytes = fs::read(&self.new_path).map_err(|e| Error::file_access(&self.new_path, e))?;
        Ok(String::from_utf8_lossy(&bytes)
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect())
    }
}

/// Every report of a run, keyed by the identity of its new path.
#[derive(Debug, Default, Clone)]
pub struct ReportSet {
    reports: BTreeMap<String, FileReport>,
}

impl ReportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `report` unless one for the same path already exists.
    /// Returns whether it was inserted.
    pub fn insert(&mut self, report: FileReport) -> bool {
        let key = path_key(report.new_path());
        if self.reports.contains_key(&key) {
            return false;
        }
        self.reports.insert(key, report);
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.reports.contains_key(&path_key(path))
    }

    pub fn get(&self, path: &Path) -> Option<&FileReport> {
        self.reports.get(&path_key(path))
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut FileReport> {
        self.reports.get_mut(&path_key(path))
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Reports in path order.
    pub fn iter(&self) -> impl Iterator<Item = &FileReport> {
        self.reports.values()
    }
}
