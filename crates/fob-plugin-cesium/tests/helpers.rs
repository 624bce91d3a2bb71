//! Shared test utilities for fob-plugin-cesium tests
//!
//! Builds a fake `node_modules/cesium` installation inside a temp directory.

#![allow(dead_code)]

use fob_plugin_cesium::{CesiumPluginOptions, FobCesiumPlugin};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const CESIUM_VERSION: &str = "1.120.0";

/// A project directory with Cesium installed
pub struct Project {
    pub temp: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let project = Self {
            temp: TempDir::new().unwrap(),
        };
        project.install(CESIUM_VERSION, "minified");
        project
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn build_root(&self) -> PathBuf {
        self.root().join("node_modules/cesium/Build")
    }

    pub fn install_root(&self) -> PathBuf {
        self.build_root().join("Cesium")
    }

    pub fn out_dir(&self) -> PathBuf {
        self.root().join("dist")
    }

    pub fn public_dir(&self) -> PathBuf {
        self.root().join("public")
    }

    /// (Re)install the library; `marker` ends up in every copied file.
    pub fn install(&self, version: &str, marker: &str) {
        let package = self.root().join("node_modules/cesium");
        fs::create_dir_all(&package).unwrap();
        fs::write(
            package.join("package.json"),
            format!(r#"{{"name":"cesium","version":"{version}"}}"#),
        )
        .unwrap();

        write_tree(&self.install_root(), &format!("{marker}-{version}"));
        write_tree(
            &self.build_root().join("CesiumUnminified"),
            &format!("unminified-{version}"),
        );
    }

    /// Options pointing at this project's installation
    pub fn options(&self) -> CesiumPluginOptions {
        CesiumPluginOptions::new()
            .with_library_install_root(self.install_root())
            .with_library_build_root(self.build_root())
    }

    pub fn plugin(&self) -> FobCesiumPlugin {
        FobCesiumPlugin::with_options(self.options())
    }
}

fn write_tree(dir: &Path, marker: &str) {
    let _ = fs::remove_dir_all(dir);
    let files = [
        "Assets/approximateTerrainHeights.json",
        "Assets/Textures/moonSmall.jpg",
        "ThirdParty/draco_decoder.wasm",
        "Workers/createGeometry.js",
        "Widgets/widgets.css",
        "Widgets/Images/info.svg",
        "Cesium.js",
    ];
    for file in files {
        let path = dir.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("/* {marker} */ {file}")).unwrap();
    }
}

pub fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path.as_ref())
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.as_ref().display()))
}
