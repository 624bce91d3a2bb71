//! Filesystem primitives for staging.
//!
//! Directory copies go through a hidden sibling directory and are renamed into
//! place, so a single entry is either fully present or untouched.

use crate::error::{CesiumError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Hidden sibling used while an entry is being copied
fn staging_path(to: &Path) -> PathBuf {
    let name = to
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    to.with_file_name(format!(".{name}.fob-staging"))
}

/// Recursively copy `from` into `to`, returning the number of files copied.
pub(crate) fn copy_tree(from: &Path, to: &Path) -> io::Result<u64> {
    let mut files = 0;
    fs::create_dir_all(to)?;

    for entry in WalkDir::new(from).follow_links(true).min_depth(1) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            files += 1;
        }
    }

    Ok(files)
}

/// Copy a directory so that `to` is replaced in one rename.
pub(crate) fn copy_dir_atomic(from: &Path, to: &Path) -> Result<u64> {
    let staging = staging_path(to);
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| CesiumError::copy(from, to, e))?;
    }

    // Leftovers from an interrupted run
    remove_path(&staging)?;

    let files = match copy_tree(from, &staging) {
        Ok(files) => files,
        Err(e) => {
            let _ = fs::remove_dir_all(&staging);
            return Err(CesiumError::copy(from, to, e));
        }
    };

    remove_path(to)?;
    fs::rename(&staging, to).map_err(|e| {
        let _ = fs::remove_dir_all(&staging);
        CesiumError::copy(from, to, e)
    })?;

    Ok(files)
}

/// Copy a single file through a temporary sibling.
pub(crate) fn copy_file_atomic(from: &Path, to: &Path) -> Result<u64> {
    let staging = staging_path(to);
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| CesiumError::copy(from, to, e))?;
    }

    fs::copy(from, &staging).map_err(|e| {
        let _ = fs::remove_file(&staging);
        CesiumError::copy(from, to, e)
    })?;

    remove_path(to)?;
    fs::rename(&staging, to).map_err(|e| CesiumError::copy(from, to, e))?;

    Ok(1)
}

/// Remove a file or directory; returns whether anything was removed.
pub(crate) fn remove_path(path: &Path) -> Result<bool> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(CesiumError::remove(path, e)),
    };

    let removed = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    removed.map_err(|e| CesiumError::remove(path, e))?;

    Ok(true)
}
