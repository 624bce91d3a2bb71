//! URL path helpers for the Cesium base URL.
//!
//! All functions here work on `/`-separated URL paths, never on OS paths.
//! Joining follows POSIX semantics: empty and `.` segments are dropped and
//! `..` pops the previous segment.

use std::path::{Path, PathBuf};

/// Split a URL path into its meaningful segments.
fn segments(path: &str) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Returns true when a public base path selects relative-base mode.
///
/// The empty string and anything starting with `.` are relative; every
/// other base is served from the site root.
pub fn is_relative_base(base: &str) -> bool {
    base.is_empty() || base.starts_with('.')
}

/// Normalize a public base path.
///
/// Relative bases collapse to `./`, absolute bases get a single leading and
/// trailing separator (`app` becomes `/app/`).
pub fn normalize_public_base(base: &str) -> String {
    if is_relative_base(base) {
        let segs = segments(base);
        if segs.is_empty() {
            return "./".to_string();
        }
        return format!("./{}/", segs.join("/"));
    }
    to_dir_path(&segments(base))
}

fn to_dir_path(segs: &[&str]) -> String {
    if segs.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", segs.join("/"))
    }
}

/// Join the public base and the library sub-path into the canonical base URL.
///
/// The result always starts and ends with `/` and never contains doubled
/// separators. Relative bases contribute their segments after the leading
/// `./`, so `("./", "cesium/")` yields `/cesium/`; callers that need the
/// relative form use [`relative_url`].
pub fn join_base_url(public_base: &str, sub_path: &str) -> String {
    // Reduce over the concatenation so `..` in the sub-path can climb out of the base.
    let joined = format!("{public_base}/{sub_path}");
    to_dir_path(&segments(&joined))
}

/// Express a canonical base URL relative to the document (`/cesium/` becomes `./cesium/`).
pub fn relative_url(base_url: &str) -> String {
    format!(".{}", ensure_leading_slash(base_url))
}

/// Append a file path below a directory URL without doubling separators.
pub fn join_url(dir: &str, file: &str) -> String {
    let dir = dir.trim_end_matches('/');
    let file = file.trim_start_matches('/');
    format!("{dir}/{file}")
}

fn ensure_leading_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Route at which the dev middleware is mounted (`/app/cesium/` becomes `/app/cesium`).
///
/// Returns `None` when the base URL is the site root.
pub fn mount_path(base_url: &str) -> Option<String> {
    let segs = segments(base_url);
    if segs.is_empty() {
        None
    } else {
        Some(format!("/{}", segs.join("/")))
    }
}

/// Filesystem directory for a URL path below `root`.
///
/// The URL's leading `/` or `./` is ignored so the path always stays inside `root`.
pub fn fs_dir(root: &Path, url_path: &str) -> PathBuf {
    segments(url_path)
        .into_iter()
        .fold(root.to_path_buf(), |dir, segment| dir.join(segment))
}
