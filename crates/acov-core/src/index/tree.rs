use super::file_index::{FileCategory, FileIndex};
use glob::Pattern;
use std::path::{Path, PathBuf};

/// A category index of the current tree, paired with the same category of
/// the previous-revision tree when one was registered.
#[derive(Debug, Clone)]
pub struct TreeIndex {
    current: FileIndex,
    previous: Option<FileIndex>,
}

impl TreeIndex {
    pub fn build(
        new_root: &Path,
        old_root: Option<&Path>,
        category: FileCategory,
        ignore_patterns: &[Pattern],
    ) -> Self {
        let current = FileIndex::build_with_ignores(new_root, category, ignore_patterns);
        let previous =
            old_root.map(|root| FileIndex::build_with_ignores(root, category, ignore_patterns));
        Self { current, previous }
    }

    pub fn has_old_tree(&self) -> bool {
        self.previous.is_some()
    }

    pub fn category(&self) -> FileCategory {
        self.current.category()
    }

    pub fn root(&self) -> &Path {
        self.current.root()
    }

    pub fn old_root(&self) -> Option<&Path> {
        self.previous.as_ref().map(|index| index.root())
    }

    pub fn current(&self) -> &FileIndex {
        &self.current
    }

    pub fn previous(&self) -> Option<&FileIndex> {
        self.previous.as_ref()
    }

    pub fn files(&self) -> &[PathBuf] {
        self.current.files()
    }

    /// Whether the current tree holds `path`.
    pub fn contains(&self, path: &Path) -> bool {
        self.current.contains(path)
    }
}
