use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Context;
use regex::Regex;

use crate::classify;

/// A filename is "similar" to another when both start with the text before
/// the first separator: hyphen, en dash, or dot.
static KEY_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-–.]").unwrap());

/// List the supported image files directly inside `dir`, in filesystem
/// listing order. Rejected entries are a verbose diagnostic, not an error.
pub fn expand_dir(dir: &Path, verbose: bool) -> anyhow::Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("failed to stat {}", path.display()))?;
        if file_type.is_dir() {
            continue;
        }
        if classify::is_supported_image(&path) {
            files.push(path);
        } else if verbose {
            println!("unsupported file type: {}", path.display());
        }
    }
    Ok(files)
}

/// The search key of a file: its base name up to the first separator.
pub fn search_key(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    KEY_SPLIT_RE
        .split(&name)
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Find files sharing `file`'s search key anywhere under its containing
/// directory (depth-unbounded, depth-first), excluding `file` itself.
/// Candidates come back in traversal order.
pub fn find_similar(file: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let dir = file.parent().unwrap_or_else(|| Path::new("/"));
    let key = search_key(file);
    let mut found = Vec::new();
    drill_down(dir, &key, &mut found)?;
    found.retain(|candidate| candidate != file);
    Ok(found)
}

/// Depth-first walk collecting prefix matches. Subdirectories are descended
/// into as encountered, before the remaining siblings of a directory are
/// examined. Paths stay absolute throughout; the process working directory
/// is never touched.
fn drill_down(dir: &Path, key: &str, found: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("failed to stat {}", path.display()))?;
        if file_type.is_dir() {
            drill_down(&path, key, found)?;
        } else if entry.file_name().to_string_lossy().starts_with(key) {
            found.push(path);
        }
    }
    Ok(())
}
