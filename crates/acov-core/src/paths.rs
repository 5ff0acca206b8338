//! Path identity policy.
//!
//! Every "have I seen this file" lookup in the crate goes through
//! [`path_key`], and every path entering the index or reported by an external
//! tool goes through [`normalize`]. Identity is syntactic: two spellings of the
//! same file that normalize differently (symlinks, bind mounts) are different
//! files. Switching to canonical-path identity only needs changes here.

use std::env;
use std::path::{Component, Path, PathBuf};

/// Make `path` absolute against the current directory and fold `.`/`..`
/// lexically. Symlinks are not resolved.
pub fn normalize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return fold_components(path);
    }
    match env::current_dir() {
        Ok(cwd) => fold_components(&cwd.join(path)),
        Err(_) => fold_components(path),
    }
}

/// Resolve a file name reported relative to `base_dir` (or already absolute).
pub fn resolve_against(base_dir: &Path, reported: &Path) -> PathBuf {
    if reported.is_absolute() {
        fold_components(reported)
    } else {
        normalize(&base_dir.join(reported))
    }
}

/// Identity key of a path.
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Deterministic, collision-free report file name for a source path:
/// separators become `_`, so `/a/x.c` and `/b/x.c` never share a page.
pub fn report_file_name(path: &Path) -> String {
    let without_prefix = get_path_without_prefix(path);
    let flattened: String = path_key(&without_prefix)
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            other => other,
        })
        .collect();
    format!("{}.html", flattened)
}

fn fold_components(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                if !result.pop() && !path.is_absolute() {
                    result.push("..");
                }
            }
            other => result.push(other.as_os_str()),
        }
    }
    result
}

fn get_path_without_prefix(path: &Path) -> PathBuf {
    path.components()
        .skip_while(|comp| matches!(comp, Component::Prefix(_)))
        .map(|comp| comp.as_os_str())
        .collect()
}
