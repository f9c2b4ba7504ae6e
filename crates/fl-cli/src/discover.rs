//! Locating the data file inside the extracted archive tree.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// Find the first file named `file_name` anywhere under `root`.
///
/// Entries are visited in name order per directory, so repeated runs over
/// the same tree resolve the same path. Later duplicates are ignored.
pub(crate) fn find_data_file(root: &Path, file_name: &str) -> Result<PathBuf> {
    match walk_for_file(root, file_name)? {
        Some(path) => Ok(path),
        None => bail!("{} not found anywhere under {}", file_name, root.display()),
    }
}

fn walk_for_file(root: &Path, file_name: &str) -> Result<Option<PathBuf>> {
    let rd = fs::read_dir(root).with_context(|| format!("read_dir {}", root.display()))?;
    let mut entries: Vec<_> = rd
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("iter dir {}", root.display()))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let ft =
            entry.file_type().with_context(|| format!("file_type {}", entry.path().display()))?;

        // Avoid symlink loops when scanning arbitrary extraction trees.
        if ft.is_symlink() {
            continue;
        }

        let path = entry.path();
        if ft.is_file()
            && let Some(name) = path.file_name().and_then(|s| s.to_str())
            && name == file_name
        {
            return Ok(Some(path));
        }

        if ft.is_dir()
            && let Some(found) = walk_for_file(&path, file_name)?
        {
            return Ok(Some(found));
        }
    }
    Ok(None)
}
