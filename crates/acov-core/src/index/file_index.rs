use crate::paths::{self, path_key};
use crate::scanner;
use glob::Pattern;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

const SOURCE_SUFFIXES: &[&str] = &[".cpp", ".cc", ".c"];
const HEADER_SUFFIXES: &[&str] = &[".h"];
const GRAPH_EXTENSION: &str = "gcda";
const GRAPH_SUFFIXES: &[&str] = &[".gcda"];

/// Kind of file an index tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileCategory {
    /// Compilable translation units. Each one is a build artifact.
    Source,
    Header,
    /// Coverage data written next to an instrumented, executed artifact.
    CoverageGraph,
}

impl FileCategory {
    pub const ALL: [FileCategory; 3] = [
        FileCategory::Source,
        FileCategory::Header,
        FileCategory::CoverageGraph,
    ];

    pub fn suffixes(self) -> &'static [&'static str] {
        match self {
            FileCategory::Source => SOURCE_SUFFIXES,
            FileCategory::Header => HEADER_SUFFIXES,
            FileCategory::CoverageGraph => GRAPH_SUFFIXES,
        }
    }

    /// Whether files of this category get a coverage report.
    pub fn is_reportable(self) -> bool {
        matches!(self, FileCategory::Source | FileCategory::Header)
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileCategory::Source => "source",
            FileCategory::Header => "header",
            FileCategory::CoverageGraph => "coverage-graph",
        };
        f.write_str(name)
    }
}

/// Coverage-graph companion of a build artifact: same directory and base
/// name, graph suffix.
pub fn graph_companion(artifact: &Path) -> PathBuf {
    artifact.with_extension(GRAPH_EXTENSION)
}

/// Snapshot of every file of one category under a root directory.
/// Built from a single scan, never mutated afterwards.
#[derive(Debug, Clone)]
pub struct FileIndex {
    root: PathBuf,
    category: FileCategory,
    files: Vec<PathBuf>,
    keys: HashSet<String>,
}

impl FileIndex {
    pub fn build(root: &Path, category: FileCategory) -> Self {
        Self::build_with_ignores(root, category, &[])
    }

    pub fn build_with_ignores(
        root: &Path,
        category: FileCategory,
        ignore_patterns: &[Pattern],
    ) -> Self {
        let root = paths::normalize(root);
        let files = scanner::collect_files(&root, category.suffixes(), ignore_patterns);
        let keys = files.iter().map(|f| path_key(f)).collect();
        debug!(
            "Indexed {} {} files under {}",
            files.len(),
            category,
            root.display()
        );

        Self {
            root,
            category,
            files,
            keys,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category(&self) -> FileCategory {
        self.category
    }

    /// Absolute paths in discovery order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Exact membership of `root.join(path)`. The check is syntactic: no
    /// normalization is applied to the query, and an absolute `path`
    /// replaces the root entirely.
    pub fn contains(&self, path: &Path) -> bool {
        self.keys.contains(&path_key(&self.root.join(path)))
    }
}
