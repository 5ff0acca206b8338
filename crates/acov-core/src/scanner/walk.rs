use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::{error, warn};
use walkdir::WalkDir;

/// Compile glob ignore patterns, logging and dropping invalid ones.
pub fn compile_ignore_patterns(ignore_globs: &[String]) -> Vec<Pattern> {
    ignore_globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect()
}

/// Walk `root` and collect every regular file whose name ends with one of
/// `suffixes`, in a deterministic (file-name sorted, depth-first) order.
///
/// Unreadable or missing directories are logged and skipped; a missing root
/// yields an empty list.
pub fn collect_files(root: &Path, suffixes: &[&str], ignore_patterns: &[Pattern]) -> Vec<PathBuf> {
    if !root.is_dir() {
        warn!("Not a readable directory, nothing indexed: {}", root.display());
        return Vec::new();
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_ignored(entry.path(), ignore_patterns));

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Error walking {}: {}", root.display(), err);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let matches_suffix = entry
            .file_name()
            .to_str()
            .map(|name| suffixes.iter().any(|suffix| name.ends_with(suffix)))
            .unwrap_or(false);
        if matches_suffix {
            files.push(entry.into_path());
        }
    }

    files
}

fn is_ignored(path: &Path, ignore_patterns: &[Pattern]) -> bool {
    ignore_patterns
        .iter()
        .any(|pattern| pattern.matches_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_collect_files_by_suffix() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("a.c"), "").unwrap();
        fs::write(tmp.path().join("b.cpp"), "").unwrap();
        fs::write(tmp.path().join("notes.txt"), "").unwrap();
        fs::write(tmp.path().join("sub/c.cc"), "").unwrap();

        let files = collect_files(tmp.path(), &[".c", ".cc", ".cpp"], &[]);
        assert_eq!(
            files,
            vec![
                tmp.path().join("a.c"),
                tmp.path().join("b.cpp"),
                tmp.path().join("sub/c.cc"),
            ]
        );
    }

    #[test]
    fn test_missing_root_is_empty() {
        let tmp = tempdir().unwrap();
        let files = collect_files(&tmp.path().join("missing"), &[".c"], &[]);
        assert!(files.is_empty());
    }

    #[test]
    fn test_ignore_patterns_prune_directories() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("third_party")).unwrap();
        fs::write(tmp.path().join("a.c"), "").unwrap();
        fs::write(tmp.path().join("third_party/z.c"), "").unwrap();

        let patterns = compile_ignore_patterns(&["*/third_party".to_string()]);
        let files = collect_files(tmp.path(), &[".c"], &patterns);
        assert_eq!(files, vec![tmp.path().join("a.c")]);
    }

    #[test]
    fn test_invalid_pattern_dropped() {
        let patterns = compile_ignore_patterns(&["[".to_string(), "*.o".to_string()]);
        assert_eq!(patterns.len(), 1);
    }
}
