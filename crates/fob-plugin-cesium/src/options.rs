//! Cesium plugin configuration
//!
//! Options are fixed when the plugin is constructed. They can be built in code
//! with the `with_*` methods or loaded from layered sources with
//! [`CesiumPluginOptions::load`].

use crate::error::{CesiumError, Result};
use figment::{
    providers::{Env, Format as _, Json, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up by [`CesiumPluginOptions::load`]
pub const CONFIG_FILE: &str = "cesium.config.json";

/// Prefix for environment overrides (`FOB_CESIUM_REBUILD_LIBRARY=true`)
pub const ENV_PREFIX: &str = "FOB_CESIUM_";

/// Configuration for the Cesium plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CesiumPluginOptions {
    /// Bundle Cesium as ordinary source instead of loading the prebuilt
    /// `Cesium.js` as a global
    pub rebuild_library: bool,

    /// Serve the minified `Cesium` build in development instead of
    /// `CesiumUnminified`
    pub use_minified_in_dev: bool,

    /// Prebuilt distribution copied into the output in build mode
    pub library_install_root: PathBuf,

    /// Directory holding the `Cesium` and `CesiumUnminified` builds
    pub library_build_root: PathBuf,

    /// Sub-path below the public base where Cesium assets are served
    pub library_sub_path: String,

    /// Static directory to stage assets into during development
    ///
    /// When unset, the dev middleware serves the library in place and
    /// nothing is copied.
    pub public_dir: Option<PathBuf>,

    /// Compare the installed library version against the staging stamp
    /// instead of only probing for `Assets/`
    pub strict_staleness: bool,

    /// Emit an inline script defining `window.CESIUM_BASE_URL` in every HTML entry
    pub base_url_script: bool,

    /// Global symbol the prebuilt `Cesium.js` assigns
    pub global_name: String,

    /// Module specifier applications import Cesium with
    pub module_id: String,
}

impl Default for CesiumPluginOptions {
    fn default() -> Self {
        Self {
            rebuild_library: false,
            use_minified_in_dev: false,
            library_install_root: PathBuf::from("node_modules/cesium/Build/Cesium"),
            library_build_root: PathBuf::from("node_modules/cesium/Build"),
            library_sub_path: "cesium/".to_string(),
            public_dir: None,
            strict_staleness: false,
            base_url_script: false,
            global_name: "Cesium".to_string(),
            module_id: "cesium".to_string(),
        }
    }
}

impl CesiumPluginOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from multiple sources.
    /// Priority: environment variables > config file > defaults
    ///
    /// `config_path` defaults to `cesium.config.json` in the working
    /// directory; a missing default file is not an error.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = config_path.map(Path::to_path_buf).or_else(|| {
            let default_path = Path::new(CONFIG_FILE);
            default_path.exists().then(|| default_path.to_path_buf())
        });

        if let Some(path) = config_file {
            figment = figment.merge(Json::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        figment.extract().map_err(CesiumError::config)
    }

    /// Bundle Cesium from source instead of externalizing it
    pub fn with_rebuild_library(mut self, enabled: bool) -> Self {
        self.rebuild_library = enabled;
        self
    }

    /// Serve the minified build in development
    pub fn with_minified_in_dev(mut self, enabled: bool) -> Self {
        self.use_minified_in_dev = enabled;
        self
    }

    /// Set the prebuilt distribution directory
    pub fn with_library_install_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_install_root = path.into();
        self
    }

    /// Set the directory containing `Cesium/` and `CesiumUnminified/`
    pub fn with_library_build_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_build_root = path.into();
        self
    }

    /// Set the serving sub-path (a trailing `/` is added if missing)
    pub fn with_library_sub_path(mut self, sub_path: impl Into<String>) -> Self {
        self.library_sub_path = sub_path.into();
        self
    }

    /// Stage assets into a static directory during development
    pub fn with_public_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.public_dir = Some(path.into());
        self
    }

    /// Enable the version-stamp staleness check
    pub fn with_strict_staleness(mut self, enabled: bool) -> Self {
        self.strict_staleness = enabled;
        self
    }

    /// Emit the `CESIUM_BASE_URL` bootstrap script tag
    pub fn with_base_url_script(mut self, enabled: bool) -> Self {
        self.base_url_script = enabled;
        self
    }

    /// Sub-path with exactly one trailing `/`
    pub fn sub_path(&self) -> String {
        let trimmed = self.library_sub_path.trim_end_matches('/');
        format!("{trimmed}/")
    }

    /// Whether `Cesium.js` is loaded as a global instead of bundled
    pub fn externalizes_library(&self) -> bool {
        !self.rebuild_library
    }

    /// Source tree served by the dev middleware
    pub fn dev_source_dir(&self) -> PathBuf {
        let flavor = if self.use_minified_in_dev {
            "Cesium"
        } else {
            "CesiumUnminified"
        };
        self.library_build_root.join(flavor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let options = CesiumPluginOptions::default();
        assert!(!options.rebuild_library);
        assert!(!options.use_minified_in_dev);
        assert_eq!(
            options.library_install_root,
            PathBuf::from("node_modules/cesium/Build/Cesium")
        );
        assert_eq!(options.library_sub_path, "cesium/");
        assert!(options.public_dir.is_none());
        assert_eq!(options.global_name, "Cesium");
        assert_eq!(options.module_id, "cesium");
    }

    #[test]
    fn test_sub_path_gets_trailing_slash() {
        let options = CesiumPluginOptions::new().with_library_sub_path("lib/cesium");
        assert_eq!(options.sub_path(), "lib/cesium/");

        let options = CesiumPluginOptions::new().with_library_sub_path("lib/cesium//");
        assert_eq!(options.sub_path(), "lib/cesium/");
    }

    #[test]
    fn test_dev_source_dir() {
        let options = CesiumPluginOptions::new().with_library_build_root("build");
        assert_eq!(options.dev_source_dir(), Path::new("build").join("CesiumUnminified"));

        let options = options.with_minified_in_dev(true);
        assert_eq!(options.dev_source_dir(), Path::new("build").join("Cesium"));
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cesium.config.json");
        fs::write(
            &path,
            r#"{ "rebuild_library": true, "library_sub_path": "vendor/cesium/" }"#,
        )
        .unwrap();

        let options = CesiumPluginOptions::load(Some(&path)).unwrap();
        assert!(options.rebuild_library);
        assert_eq!(options.library_sub_path, "vendor/cesium/");
        assert!(!options.use_minified_in_dev);
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cesium.config.json");
        fs::write(&path, r#"{ "use_minified_in_dev": false }"#).unwrap();

        unsafe {
            std::env::set_var("FOB_CESIUM_USE_MINIFIED_IN_DEV", "true");
        }
        let options = CesiumPluginOptions::load(Some(&path));
        unsafe {
            std::env::remove_var("FOB_CESIUM_USE_MINIFIED_IN_DEV");
        }

        assert!(options.unwrap().use_minified_in_dev);
    }

    #[test]
    #[serial]
    fn test_invalid_value_is_config_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cesium.config.json");
        fs::write(&path, r#"{ "rebuild_library": "sometimes" }"#).unwrap();

        let err = CesiumPluginOptions::load(Some(&path)).unwrap_err();
        assert!(matches!(err, CesiumError::Config { .. }));
    }
}
