//! Cesium asset staging.
//!
//! Cesium needs its static tree (`Assets`, `ThirdParty`, `Workers`, `Widgets`
//! and, when loaded as a global, `Cesium.js`) next to the application at the
//! session's base URL.
//!
//! ## Build sessions
//!
//! ```text
//! verify sources → remove previous entries → copy entries in order → write stamp
//! ```
//!
//! Every entry is removed first so two library versions are never mixed in
//! one output directory. `Cesium.js` is removed and not copied back when the
//! library is rebuilt from source, otherwise a stale copy would shadow the
//! bundled code.
//!
//! ## Serve sessions
//!
//! Only staged when a public directory is configured. An existing `Assets/`
//! directory counts as staged (or, with `strict_staleness`, a stamp matching
//! the installed version).
//!
//! Entries are copied one at a time. A directory copy is atomic through a
//! rename; the sequence as a whole is not, and the first failure stops the
//! remaining entries.

mod copy;
mod stamp;

pub use stamp::{STAMP_FILE, StageStamp, installed_version};

use crate::error::{CesiumError, Result};
use crate::options::CesiumPluginOptions;
use crate::paths;
use crate::session::{Mode, Session};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directories every Cesium installation ships, in copy order
pub const ASSET_DIRECTORIES: [&str; 4] = ["Assets", "ThirdParty", "Workers", "Widgets"];

/// Prebuilt entry point loaded as a global when the library is external
pub const PREBUILT_SCRIPT: &str = "Cesium.js";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
}

/// One staged sub-tree or file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub name: &'static str,
    pub kind: EntryKind,
}

/// The entries a session must stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetManifest {
    entries: Vec<ManifestEntry>,
}

impl AssetManifest {
    pub fn for_options(options: &CesiumPluginOptions) -> Self {
        let mut entries: Vec<ManifestEntry> = ASSET_DIRECTORIES
            .iter()
            .map(|&name| ManifestEntry {
                name,
                kind: EntryKind::Directory,
            })
            .collect();

        if options.externalizes_library() {
            entries.push(ManifestEntry {
                name: PREBUILT_SCRIPT,
                kind: EntryKind::File,
            });
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn includes_script(&self) -> bool {
        self.entries.iter().any(|e| e.name == PREBUILT_SCRIPT)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.to_string()).collect()
    }
}

/// Why staging did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Serve session without a public directory; the middleware serves in place
    ServedInPlace,
    /// The destination already holds the assets
    AlreadyStaged,
}

/// What a staging run did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub destination: PathBuf,
    /// Entries copied, in order
    pub staged: Vec<String>,
    /// Entries removed before copying (or because they must be absent)
    pub removed: Vec<String>,
    pub files_copied: u64,
    pub skipped: Option<SkipReason>,
}

impl StageReport {
    fn new(destination: PathBuf) -> Self {
        Self {
            destination,
            staged: Vec::new(),
            removed: Vec::new(),
            files_copied: 0,
            skipped: None,
        }
    }

    fn skipped(destination: PathBuf, reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::new(destination)
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }
}

/// Destination directory for a session, or `None` when nothing is staged.
pub fn destination(session: &Session, options: &CesiumPluginOptions) -> Option<PathBuf> {
    match session.mode() {
        Mode::Build => Some(session.stage_dir()),
        Mode::Serve => options
            .public_dir
            .as_ref()
            .map(|dir| paths::fs_dir(dir, &options.sub_path())),
    }
}

/// Ensure the asset manifest exists at the session's destination.
pub async fn stage(session: &Session, options: &CesiumPluginOptions) -> Result<StageReport> {
    let Some(destination) = destination(session, options) else {
        debug!("[fob-cesium] No public directory configured, serving Cesium in place");
        return Ok(StageReport::skipped(PathBuf::new(), SkipReason::ServedInPlace));
    };

    let manifest = AssetManifest::for_options(options);

    if session.mode().is_serve() && is_staged(&destination, options) {
        debug!(
            destination = %destination.display(),
            "[fob-cesium] Cesium assets already staged"
        );
        return Ok(StageReport::skipped(destination, SkipReason::AlreadyStaged));
    }

    let source = options.library_install_root.clone();
    let rebuild = options.rebuild_library;

    tokio::task::spawn_blocking(move || stage_blocking(&source, &destination, &manifest, rebuild))
        .await?
}

/// Shallow probe (or version comparison) for serve sessions
fn is_staged(destination: &Path, options: &CesiumPluginOptions) -> bool {
    if !destination.join(ASSET_DIRECTORIES[0]).is_dir() {
        return false;
    }
    if !options.strict_staleness {
        return true;
    }

    let installed = installed_version(&options.library_install_root);
    StageStamp::read(destination)
        .map(|stamp| stamp.matches(installed.as_deref()))
        .unwrap_or(false)
}

fn stage_blocking(
    source: &Path,
    destination: &Path,
    manifest: &AssetManifest,
    rebuild_library: bool,
) -> Result<StageReport> {
    let mut report = StageReport::new(destination.to_path_buf());

    // A stale prebuilt script would shadow the bundled library, even if the
    // rest of the run fails.
    if rebuild_library && copy::remove_path(&destination.join(PREBUILT_SCRIPT))? {
        report.removed.push(PREBUILT_SCRIPT.to_string());
    }

    // Verify every source before touching the destination.
    for entry in manifest.entries() {
        let from = source.join(entry.name);
        let present = match entry.kind {
            EntryKind::Directory => from.is_dir(),
            EntryKind::File => from.is_file(),
        };
        if !present {
            return Err(CesiumError::source_missing(from));
        }
    }

    copy::remove_path(&destination.join(STAMP_FILE))?;
    for name in ASSET_DIRECTORIES.iter().copied().chain([PREBUILT_SCRIPT]) {
        if copy::remove_path(&destination.join(name))? {
            report.removed.push(name.to_string());
        }
    }

    for entry in manifest.entries() {
        let from = source.join(entry.name);
        let to = destination.join(entry.name);
        let files = match entry.kind {
            EntryKind::Directory => copy::copy_dir_atomic(&from, &to)?,
            EntryKind::File => copy::copy_file_atomic(&from, &to)?,
        };
        debug!(entry = entry.name, files, "[fob-cesium] Staged entry");
        report.staged.push(entry.name.to_string());
        report.files_copied += files;
    }

    let stamp = StageStamp {
        version: installed_version(source),
        entries: manifest.names(),
        rebuild_library,
    };
    stamp.write(destination)?;

    info!(
        destination = %destination.display(),
        entries = report.staged.len(),
        files = report.files_copied,
        "[fob-cesium] Staged Cesium assets"
    );

    Ok(report)
}
