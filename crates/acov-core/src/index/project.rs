use super::file_index::FileCategory;
use super::tree::TreeIndex;
use crate::paths::{self, path_key};
use crate::scanner;
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::info;

/// All category trees of one registered project directory. One tree per
/// category, built together at registration.
#[derive(Debug, Clone)]
pub struct ProjectTrees {
    root: PathBuf,
    source: TreeIndex,
    header: TreeIndex,
    graph: TreeIndex,
}

impl ProjectTrees {
    fn build(new_dir: &Path, old_dir: Option<&Path>, ignore_patterns: &[Pattern]) -> Self {
        let root = paths::normalize(new_dir);
        let old_root = old_dir.map(paths::normalize);
        let build_tree = |category| {
            TreeIndex::build(&root, old_root.as_deref(), category, ignore_patterns)
        };

        Self {
            source: build_tree(FileCategory::Source),
            header: build_tree(FileCategory::Header),
            graph: build_tree(FileCategory::CoverageGraph),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn old_root(&self) -> Option<&Path> {
        self.source.old_root()
    }

    pub fn has_old_tree(&self) -> bool {
        self.source.has_old_tree()
    }

    pub fn tree(&self, category: FileCategory) -> &TreeIndex {
        match category {
            FileCategory::Source => &self.source,
            FileCategory::Header => &self.header,
            FileCategory::CoverageGraph => &self.graph,
        }
    }

    pub fn trees(&self) -> impl Iterator<Item = &TreeIndex> {
        FileCategory::ALL.into_iter().map(move |category| self.tree(category))
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.trees().any(|tree| tree.contains(path))
    }

    /// Where `new_file` would live in the old tree, if this project has one
    /// and the file lies under this project's root.
    pub fn old_counterpart(&self, new_file: &Path) -> Option<PathBuf> {
        let old_root = self.old_root()?;
        let relative = new_file.strip_prefix(&self.root).ok()?;
        Some(old_root.join(relative))
    }
}

/// Registry of every project directory taking part in a run.
#[derive(Debug, Default)]
pub struct ProjectIndex {
    projects: Vec<ProjectTrees>,
    ignore_patterns: Vec<Pattern>,
}

impl ProjectIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ignore_patterns(ignore_globs: &[String]) -> Self {
        Self {
            projects: Vec::new(),
            ignore_patterns: scanner::compile_ignore_patterns(ignore_globs),
        }
    }

    /// Index `new_dir` (and `old_dir` with the same relative structure).
    /// Registering the same directory again replaces the earlier entry.
    pub fn register(&mut self, new_dir: &Path, old_dir: Option<&Path>) {
        info!("Indexing {}", new_dir.display());
        let trees = ProjectTrees::build(new_dir, old_dir, &self.ignore_patterns);
        let key = path_key(trees.root());
        match self
            .projects
            .iter_mut()
            .find(|existing| path_key(existing.root()) == key)
        {
            Some(existing) => *existing = trees,
            None => self.projects.push(trees),
        }
    }

    pub fn projects(&self) -> &[ProjectTrees] {
        &self.projects
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Whether any registered project, in any category, holds `path`.
    pub fn any_tree_contains(&self, path: &Path) -> bool {
        self.projects.iter().any(|project| project.contains(path))
    }

    /// The registered project with the deepest root containing `path`.
    pub fn project_for(&self, path: &Path) -> Option<&ProjectTrees> {
        self.projects
            .iter()
            .filter(|project| path.starts_with(project.root()))
            .max_by_key(|project| project.root().components().count())
    }

    /// Where `path` lives in the previous revision. The deepest registered
    /// project that contains `path` and has an old tree decides.
    pub fn old_counterpart(&self, path: &Path) -> Option<PathBuf> {
        self.projects
            .iter()
            .filter(|project| project.has_old_tree() && path.starts_with(project.root()))
            .max_by_key(|project| project.root().components().count())
            .and_then(|project| project.old_counterpart(path))
    }

    /// Projects whose root is not nested inside another registered root.
    /// Their trees already hold every file of the nested ones, so walking
    /// only these visits each build artifact once.
    pub fn outermost(&self) -> impl Iterator<Item = &ProjectTrees> {
        self.projects.iter().filter(move |project| {
            !self.projects.iter().any(|other| {
                other.root() != project.root() && project.root().starts_with(other.root())
            })
        })
    }

    /// Total number of indexed files across projects and categories. Files
    /// of nested projects are counted once.
    pub fn file_count(&self) -> usize {
        self.outermost()
            .flat_map(|project| project.trees())
            .map(|tree| tree.files().len())
            .sum()
    }
}
