//! Staging stamp: records which library version a destination holds.

use crate::error::{CesiumError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// File written next to the staged entries after a complete copy
pub const STAMP_FILE: &str = ".cesium-stamp.json";

/// How far above the install root to look for Cesium's `package.json`
const PACKAGE_JSON_SEARCH_DEPTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStamp {
    /// `version` from the installed library's `package.json`, if found
    pub version: Option<String>,
    /// Manifest entries present at the destination
    pub entries: Vec<String>,
    /// Whether the prebuilt script was deliberately left out
    pub rebuild_library: bool,
}

impl StageStamp {
    /// Read the stamp from a staged destination; missing or corrupt stamps read as `None`.
    pub fn read(destination: &Path) -> Option<Self> {
        let path = destination.join(STAMP_FILE);
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(stamp) => Some(stamp),
            Err(e) => {
                debug!(
                    path = %path.display(),
                    error = %e,
                    "[fob-cesium] Ignoring unreadable stamp"
                );
                None
            }
        }
    }

    pub fn write(&self, destination: &Path) -> Result<()> {
        let path = destination.join(STAMP_FILE);
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CesiumError::stamp(&path, e.to_string()))?;
        fs::write(&path, json).map_err(|e| CesiumError::stamp(&path, e.to_string()))
    }

    /// Whether this stamp describes the given installed version
    pub fn matches(&self, installed: Option<&str>) -> bool {
        match (self.version.as_deref(), installed) {
            (Some(staged), Some(installed)) => staged == installed,
            // Without a version on either side there is nothing to compare.
            _ => false,
        }
    }
}

/// Version of the library installed above `install_root`.
///
/// Walks up from the install root (`node_modules/cesium/Build/Cesium`) to the
/// first `package.json` that carries a version.
pub fn installed_version(install_root: &Path) -> Option<String> {
    install_root
        .ancestors()
        .take(PACKAGE_JSON_SEARCH_DEPTH)
        .map(|dir| dir.join("package.json"))
        .filter(|path| path.is_file())
        .find_map(|path| {
            let content = fs::read_to_string(&path).ok()?;
            let manifest: serde_json::Value = serde_json::from_str(&content).ok()?;
            manifest
                .get("version")
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_installed_version_walks_up() {
        let temp = TempDir::new().unwrap();
        let package = temp.path().join("node_modules/cesium");
        let install_root = package.join("Build/Cesium");
        fs::create_dir_all(&install_root).unwrap();
        fs::write(
            package.join("package.json"),
            r#"{ "name": "cesium", "version": "1.120.0" }"#,
        )
        .unwrap();

        assert_eq!(installed_version(&install_root).as_deref(), Some("1.120.0"));
    }

    #[test]
    fn test_installed_version_missing() {
        let temp = TempDir::new().unwrap();
        assert_eq!(installed_version(&temp.path().join("Build/Cesium")), None);
    }

    #[test]
    fn test_stamp_write_and_read() {
        let temp = TempDir::new().unwrap();
        let stamp = StageStamp {
            version: Some("1.120.0".to_string()),
            entries: vec!["Assets".to_string(), "Cesium.js".to_string()],
            rebuild_library: false,
        };
        stamp.write(temp.path()).unwrap();

        let read = StageStamp::read(temp.path()).unwrap();
        assert_eq!(read, stamp);
        assert!(read.matches(Some("1.120.0")));
        assert!(!read.matches(Some("1.121.0")));
        assert!(!read.matches(None));
    }

    #[test]
    fn test_corrupt_stamp_reads_as_none() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(STAMP_FILE), "not json").unwrap();
        assert!(StageStamp::read(temp.path()).is_none());
    }
}
