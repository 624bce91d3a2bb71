//! Build session state shared by every plugin hook.
//!
//! A [`Session`] is produced once by [`Session::resolve`] from the host's
//! resolved configuration and is then passed by reference to the other hooks.
//! Hooks can only run against a resolved (or default) session, so there is no
//! ordering between "config resolved" and "read the base URL" to get wrong.

use crate::paths;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default output directory when the host does not report one
pub const DEFAULT_OUT_DIR: &str = "dist";

/// How the host tool was invoked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Development server
    #[default]
    Serve,
    /// Production build
    Build,
}

impl Mode {
    /// Map a host command name to a mode; anything but `build` serves.
    pub fn from_command(command: &str) -> Self {
        if command.eq_ignore_ascii_case("build") {
            Mode::Build
        } else {
            Mode::Serve
        }
    }

    pub fn is_build(self) -> bool {
        self == Mode::Build
    }

    pub fn is_serve(self) -> bool {
        self == Mode::Serve
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Serve => write!(f, "serve"),
            Mode::Build => write!(f, "build"),
        }
    }
}

/// The parts of the host's resolved configuration the plugin reads
///
/// `base` is kept as a raw JSON value because hosts forward whatever the user
/// wrote; non-string values are tolerated and replaced by `/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    pub mode: Mode,
    #[serde(default)]
    pub base: Option<Value>,
    #[serde(default)]
    pub out_dir: Option<PathBuf>,
}

impl HostConfig {
    /// Configuration for a `serve` invocation
    pub fn serve() -> Self {
        Self {
            mode: Mode::Serve,
            ..Default::default()
        }
    }

    /// Configuration for a `build` invocation
    pub fn build() -> Self {
        Self {
            mode: Mode::Build,
            ..Default::default()
        }
    }

    /// Configuration from a host command name
    pub fn from_command(command: &str) -> Self {
        Self {
            mode: Mode::from_command(command),
            ..Default::default()
        }
    }

    /// Set the application's public base path
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(Value::String(base.into()));
        self
    }

    /// Set the public base from an unvalidated config value
    pub fn with_raw_base(mut self, base: Value) -> Self {
        self.base = Some(base);
        self
    }

    /// Set the build output directory
    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(out_dir.into());
        self
    }
}

/// Resolved per-invocation state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    mode: Mode,
    public_base: String,
    library_sub_path: String,
    base_url: String,
    out_dir: PathBuf,
}

impl Default for Session {
    fn default() -> Self {
        Self::resolve(&HostConfig::default(), "cesium/")
    }
}

impl Session {
    /// Resolve mode and paths from the host configuration.
    ///
    /// Never fails: a malformed base falls back to `/` with a warning. The
    /// result depends only on the inputs, so resolving twice yields equal
    /// sessions.
    pub fn resolve(host: &HostConfig, library_sub_path: &str) -> Self {
        let public_base = match &host.base {
            None => "/".to_string(),
            Some(Value::String(base)) => paths::normalize_public_base(base),
            Some(other) => {
                warn!(
                    base = %other,
                    "[fob-cesium] Ignoring non-string base path, serving from /"
                );
                "/".to_string()
            }
        };

        let base_url = paths::join_base_url(&public_base, library_sub_path);
        let out_dir = host
            .out_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));

        debug!(
            mode = %host.mode,
            public_base = %public_base,
            base_url = %base_url,
            "[fob-cesium] Session resolved"
        );

        Self {
            mode: host.mode,
            public_base,
            library_sub_path: library_sub_path.to_string(),
            base_url,
            out_dir,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Normalized public base (`./` in relative-base mode)
    pub fn public_base(&self) -> &str {
        &self.public_base
    }

    pub fn library_sub_path(&self) -> &str {
        &self.library_sub_path
    }

    /// Canonical base URL, always of the form `/…/`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Whether the application is served from a relative base (`./`)
    pub fn is_relative(&self) -> bool {
        paths::is_relative_base(&self.public_base)
    }

    /// Base URL as it must appear in documents and the runtime constant.
    ///
    /// Relative-base sessions get `./cesium/` rather than `/cesium/`.
    pub fn public_url(&self) -> String {
        if self.is_relative() {
            paths::relative_url(&self.base_url)
        } else {
            self.base_url.clone()
        }
    }

    /// URL of a file below the Cesium base
    pub fn asset_url(&self, file: &str) -> String {
        paths::join_url(&self.public_url(), file)
    }

    /// Directory the build-mode asset tree is staged into
    pub fn stage_dir(&self) -> PathBuf {
        paths::fs_dir(&self.out_dir, &self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mode_from_command() {
        assert_eq!(Mode::from_command("build"), Mode::Build);
        assert_eq!(Mode::from_command("BUILD"), Mode::Build);
        assert_eq!(Mode::from_command("serve"), Mode::Serve);
        assert_eq!(Mode::from_command("dev"), Mode::Serve);
    }

    #[test]
    fn test_default_session() {
        let session = Session::default();
        assert_eq!(session.mode(), Mode::Serve);
        assert_eq!(session.public_base(), "/");
        assert_eq!(session.base_url(), "/cesium/");
        assert_eq!(session.out_dir(), Path::new("dist"));
    }

    #[test]
    fn test_empty_base_is_relative() {
        let session = Session::resolve(&HostConfig::build().with_base(""), "cesium/");
        assert_eq!(session.public_base(), "./");
        assert!(session.is_relative());
        assert_eq!(session.base_url(), "/cesium/");
        assert_eq!(session.public_url(), "./cesium/");
        assert_eq!(session.asset_url("Cesium.js"), "./cesium/Cesium.js");
    }

    #[test]
    fn test_non_string_base_falls_back_to_root() {
        for raw in [json!(42), json!(null), json!(["/app/"]), json!({ "path": "/x" })] {
            let session =
                Session::resolve(&HostConfig::serve().with_raw_base(raw), "cesium/");
            assert_eq!(session.public_base(), "/");
            assert_eq!(session.base_url(), "/cesium/");
        }
    }

    #[test]
    fn test_out_dir_and_stage_dir() {
        let host = HostConfig::build().with_base("/app/").with_out_dir("build/web");
        let session = Session::resolve(&host, "cesium/");
        assert_eq!(session.out_dir(), Path::new("build/web"));
        assert_eq!(
            session.stage_dir(),
            Path::new("build/web").join("app").join("cesium")
        );
    }

    #[test]
    fn test_host_config_deserializes() {
        let host: HostConfig =
            serde_json::from_value(json!({ "mode": "build", "base": 7 })).unwrap();
        assert_eq!(host.mode, Mode::Build);
        assert!(host.out_dir.is_none());
        let session = Session::resolve(&host, "cesium/");
        assert_eq!(session.base_url(), "/cesium/");
    }
}
