//! Fob plugin for CesiumJS
//!
//! CesiumJS does not fit a bundler's default assumptions: besides its modules
//! it ships static assets, web workers, third-party code and a widget
//! stylesheet, all of which must be reachable at a base URL known at runtime.
//! This crate wires that up across the host's lifecycle:
//!
//! ```text
//! resolve()               → Session (mode, base URL, output dir)
//! config()                → define CESIUM_BASE_URL, externalize `cesium` in builds
//! configure_server()      → serve the local Cesium build at the base URL (serve)
//! close_bundle()          → stage Assets/ThirdParty/Workers/Widgets/Cesium.js (build)
//! transform_index_html()  → widgets.css link, Cesium.js script
//! ```
//!
//! Every hook after `resolve` takes the [`Session`] by reference, so no hook
//! can observe half-resolved state.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fob_plugin_cesium::{CesiumPluginOptions, FobCesiumPlugin, HostConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let plugin = FobCesiumPlugin::with_options(CesiumPluginOptions::load(None)?);
//! let session = plugin.resolve(&HostConfig::build().with_base("/").with_out_dir("dist"));
//!
//! let mut bundler_options = rolldown::BundlerOptions::default();
//! plugin.config(&session).apply_to(&mut bundler_options, &[]);
//! let rolldown_plugin = Arc::new(plugin.globals_plugin(&session));
//! // ... run the bundler with `bundler_options` and `rolldown_plugin` ...
//!
//! plugin.close_bundle(&session).await;
//! let tags = plugin.transform_index_html(&session);
//! # let _ = (rolldown_plugin, tags);
//! # Ok(())
//! # }
//! ```

use axum::Router;
use tracing::error;

pub mod dev;
pub mod error;
pub mod globals;
pub mod html;
pub mod options;
pub mod overrides;
pub mod paths;
pub mod session;
pub mod staging;

pub use dev::dev_router;
pub use error::{CesiumError, Result};
pub use globals::{CesiumGlobalsPlugin, RewriteReport};
pub use html::{HtmlTag, html_tags, inject_tags};
pub use options::CesiumPluginOptions;
pub use overrides::{BASE_URL_CONSTANT, ConfigOverrides, config};
pub use session::{HostConfig, Mode, Session};
pub use staging::{AssetManifest, SkipReason, StageReport, stage};

/// Cesium integration for one host build or dev server
///
/// Holds only the immutable options; per-invocation state lives in the
/// [`Session`] returned by [`FobCesiumPlugin::resolve`].
#[derive(Debug, Clone, Default)]
pub struct FobCesiumPlugin {
    options: CesiumPluginOptions,
}

impl FobCesiumPlugin {
    /// Create a plugin with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a plugin with custom options
    pub fn with_options(options: CesiumPluginOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CesiumPluginOptions {
        &self.options
    }

    pub fn name(&self) -> &'static str {
        "fob-cesium"
    }

    /// Config-resolution hook: fix mode and paths for this invocation.
    pub fn resolve(&self, host: &HostConfig) -> Session {
        Session::resolve(host, &self.options.sub_path())
    }

    /// Config-mutation hook
    pub fn config(&self, session: &Session) -> ConfigOverrides {
        overrides::config(session, &self.options)
    }

    /// Rolldown plugin rewriting imports of the external library to its global
    pub fn globals_plugin(&self, session: &Session) -> CesiumGlobalsPlugin {
        CesiumGlobalsPlugin::from_overrides(&self.config(session))
    }

    /// Dev-server hook; returns `None` for build sessions.
    pub fn configure_server(&self, session: &Session) -> Option<Router> {
        session
            .mode()
            .is_serve()
            .then(|| dev_router(session, &self.options))
    }

    /// Build-start hook: stages into the public directory in serve sessions.
    ///
    /// Build sessions stage at [`close_bundle`](Self::close_bundle) instead.
    pub async fn build_start(&self, session: &Session) -> Option<StageReport> {
        if session.mode().is_build() {
            return None;
        }
        self.stage_best_effort(session).await
    }

    /// Bundle-close hook: stages the asset tree into the output directory.
    ///
    /// Failures are logged and reported as `None`; the build itself carries
    /// on because its output is already written.
    pub async fn close_bundle(&self, session: &Session) -> Option<StageReport> {
        if session.mode().is_serve() {
            return None;
        }
        self.stage_best_effort(session).await
    }

    /// HTML-transform hook, called once per entry document
    pub fn transform_index_html(&self, session: &Session) -> Vec<HtmlTag> {
        html_tags(session, &self.options)
    }

    async fn stage_best_effort(&self, session: &Session) -> Option<StageReport> {
        match staging::stage(session, &self.options).await {
            Ok(report) => Some(report),
            Err(err) => {
                error!(
                    mode = %session.mode(),
                    base_url = session.base_url(),
                    error = %err,
                    "[fob-cesium] Failed to stage Cesium assets"
                );
                None
            }
        }
    }
}
