//! Bundler configuration overrides for a Cesium session.
//!
//! [`config`] is pure: it looks at the session and options and returns what
//! the host should change. Nothing here touches the filesystem.

use crate::options::CesiumPluginOptions;
use crate::session::{Mode, Session};
use rolldown::{BundlerOptions, GlobalsOutputOption, IsExternal};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHasher};
use serde::Serialize;
use std::hash::BuildHasherDefault;

/// Map type of rolldown's `define` option
type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Name of the global constant holding the Cesium base URL
pub const BASE_URL_CONSTANT: &str = "CESIUM_BASE_URL";

/// Chunk size warning limit (kB) when Cesium is bundled from source
pub const REBUILD_CHUNK_SIZE_WARNING_LIMIT: u32 = 5000;

/// Configuration changes requested by the plugin
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigOverrides {
    /// Compile-time constants: identifier to JavaScript expression
    pub define: Vec<(String, String)>,

    /// Modules provided at runtime instead of bundled
    pub external: Vec<String>,

    /// Global variable backing each external module
    pub globals: FxHashMap<String, String>,

    /// Modules to keep out of dependency pre-bundling in development
    pub optimize_deps_exclude: Vec<String>,

    /// Inline assets below this size (bytes); `Some(0)` disables inlining
    pub assets_inline_limit: Option<u32>,

    /// Chunk size (kB) above which the host warns
    pub chunk_size_warning_limit: Option<u32>,
}

impl ConfigOverrides {
    /// Whether the library is declared external
    pub fn is_external(&self, module_id: &str) -> bool {
        self.external.iter().any(|m| m == module_id)
    }

    /// Look up a define value by identifier
    pub fn define_value(&self, key: &str) -> Option<&str> {
        self.define
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Write the overrides into rolldown options.
    ///
    /// The define goes through rolldown's AST-aware replacement, so the
    /// constant's name inside strings or property keys is left alone. Entries
    /// the host already defined win.
    ///
    /// `user_external` is the host's own external list; rolldown keeps a
    /// single `IsExternal`, so both lists are merged here.
    pub fn apply_to(&self, options: &mut BundlerOptions, user_external: &[String]) {
        let define = options.define.get_or_insert_with(FxIndexMap::default);
        for (key, value) in &self.define {
            define.entry(key.clone()).or_insert_with(|| value.clone());
        }

        if self.external.is_empty() {
            return;
        }

        let mut external: Vec<String> = user_external.to_vec();
        for module in &self.external {
            if !external.contains(module) {
                external.push(module.clone());
            }
        }
        options.external = Some(IsExternal::from(external));
        options.globals = Some(GlobalsOutputOption::from(self.globals.clone()));
    }
}

/// Compute the overrides for a resolved session.
///
/// - the base URL constant is always defined;
/// - the library is external only when building without `rebuild_library`;
/// - serve sessions exclude the library from dependency pre-bundling.
pub fn config(session: &Session, options: &CesiumPluginOptions) -> ConfigOverrides {
    let mut overrides = ConfigOverrides::default();

    // serde_json::to_string on a &str cannot fail
    let literal = serde_json::Value::String(session.public_url()).to_string();
    overrides
        .define
        .push((BASE_URL_CONSTANT.to_string(), literal));

    match session.mode() {
        Mode::Build if options.externalizes_library() => {
            overrides.external.push(options.module_id.clone());
            overrides
                .globals
                .insert(options.module_id.clone(), options.global_name.clone());
        }
        Mode::Build => {
            overrides.assets_inline_limit = Some(0);
            overrides.chunk_size_warning_limit = Some(REBUILD_CHUNK_SIZE_WARNING_LIMIT);
        }
        Mode::Serve => {
            overrides.optimize_deps_exclude.push(options.module_id.clone());
        }
    }

    overrides
}
