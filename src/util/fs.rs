//! Filesystem utilities.

use std::fs;
use std::io;
use std::path::{Component, Path};

/// Check whether a file or directory name is ignored by the build tool.
pub fn is_ignored_name(name: &str) -> bool {
    name.starts_with('_') || name.starts_with('.')
}

/// Names of the regular files in `dir` that are not ignored, sorted.
pub fn list_source_files(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::debug!("skipping non-UTF-8 file name in {}", dir.display());
            continue;
        };
        if !is_ignored_name(&name) {
            names.push(name);
        }
    }

    names.sort();
    Ok(names)
}

/// Slash-separated path of `path` relative to `base`.
///
/// Returns `None` if `path` is not inside `base`.
pub fn slash_relative(base: &Path, path: &Path) -> Option<String> {
    if !path.starts_with(base) {
        return None;
    }
    let rel = pathdiff::diff_paths(path, base)?;

    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?.to_string()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(parts.join("/"))
}
