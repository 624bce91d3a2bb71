//! Error types for Cesium asset staging and option loading

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CesiumError>;

/// Errors that can occur while loading options or staging Cesium assets
#[derive(Error, Debug, Diagnostic)]
pub enum CesiumError {
    /// Options could not be extracted from the configured sources
    #[error("Invalid Cesium plugin configuration: {source}")]
    #[diagnostic(
        code(fob::cesium::invalid_config),
        help("Check cesium.config.json and FOB_CESIUM_* environment variables")
    )]
    Config {
        #[source]
        source: Box<figment::Error>,
    },

    /// A manifest entry is missing from the library install root
    #[error("Cesium build output not found: {}", path.display())]
    #[diagnostic(
        code(fob::cesium::source_missing),
        help("Install Cesium (npm install cesium) or set library_install_root")
    )]
    SourceMissing { path: PathBuf },

    /// Copying a manifest entry failed
    #[error("Failed to copy {} to {}: {source}", from.display(), to.display())]
    #[diagnostic(code(fob::cesium::copy_failed))]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Removing a previously staged entry failed
    #[error("Failed to remove {}: {source}", path.display())]
    #[diagnostic(
        code(fob::cesium::remove_failed),
        help("Check permissions on the output directory")
    )]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing the staging stamp failed
    #[error("Failed to access staging stamp {}: {message}", path.display())]
    #[diagnostic(code(fob::cesium::stamp_failed))]
    Stamp { path: PathBuf, message: String },

    /// The blocking copy task panicked or was cancelled
    #[error("Cesium staging task failed: {0}")]
    #[diagnostic(code(fob::cesium::task_failed))]
    Join(#[from] tokio::task::JoinError),
}

impl CesiumError {
    pub fn config(source: figment::Error) -> Self {
        Self::Config {
            source: Box::new(source),
        }
    }

    pub fn source_missing(path: impl Into<PathBuf>) -> Self {
        Self::SourceMissing { path: path.into() }
    }

    pub fn copy(from: impl Into<PathBuf>, to: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Copy {
            from: from.into(),
            to: to.into(),
            source,
        }
    }

    pub fn remove(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Remove {
            path: path.into(),
            source,
        }
    }

    pub fn stamp(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Stamp {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_error_mentions_both_paths() {
        let err = CesiumError::copy(
            "node_modules/cesium/Build/Cesium/Assets",
            "dist/cesium/Assets",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.to_string();
        assert!(message.contains("node_modules/cesium/Build/Cesium/Assets"));
        assert!(message.contains("dist/cesium/Assets"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn test_diagnostic_code() {
        let err = CesiumError::source_missing("missing/Workers");
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("fob::cesium::source_missing"));
    }
}
