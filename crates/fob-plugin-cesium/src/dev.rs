//! Development middleware serving the local Cesium build.
//!
//! Serve sessions never copy anything by default: requests below the base URL
//! are answered straight from `CesiumUnminified/` (or `Cesium/`). Workers load
//! assets from a different computed origin, so every response allows any
//! origin.

use crate::options::CesiumPluginOptions;
use crate::paths;
use crate::session::Session;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

/// Build the router serving Cesium at the session's base URL.
///
/// Merge it into the dev server's router:
///
/// ```rust,no_run
/// use axum::Router;
/// use fob_plugin_cesium::{dev_router, CesiumPluginOptions, Session};
///
/// let cesium = dev_router(&Session::default(), &CesiumPluginOptions::default());
/// let app: Router = Router::new().merge(cesium);
/// ```
pub fn dev_router(session: &Session, options: &CesiumPluginOptions) -> Router {
    let source = options.dev_source_dir();
    if !source.is_dir() {
        warn!(
            source = %source.display(),
            "[fob-cesium] Cesium build directory not found, assets will 404"
        );
    }

    let serve_dir = ServeDir::new(&source);
    let router = match paths::mount_path(session.base_url()) {
        Some(mount) => {
            info!(
                mount = %mount,
                source = %source.display(),
                "[fob-cesium] Serving Cesium"
            );
            Router::new().nest_service(&mount, serve_dir)
        }
        None => Router::new().fallback_service(serve_dir),
    };

    router.layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}
