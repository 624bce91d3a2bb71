//! Dev middleware tests, driven through the router without a socket.

mod helpers;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use axum::Router;
use fob_plugin_cesium::{HostConfig, Session, dev_router};
use helpers::Project;
use tower::ServiceExt;

async fn get(router: Router, uri: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    router.oneshot(request).await.unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_serves_unminified_build_by_default() {
    let project = Project::new();
    let session = Session::resolve(&HostConfig::serve(), "cesium/");
    let router = dev_router(&session, &project.options());

    let response = get(router, "/cesium/Cesium.js").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("unminified"));
}

#[tokio::test]
async fn test_serves_minified_build_when_requested() {
    let project = Project::new();
    let session = Session::resolve(&HostConfig::serve(), "cesium/");
    let router = dev_router(&session, &project.options().with_minified_in_dev(true));

    let response = get(router, "/cesium/Workers/createGeometry.js").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("minified-") && !body.contains("unminified"));
}

#[tokio::test]
async fn test_allows_any_origin() {
    let project = Project::new();
    let session = Session::resolve(&HostConfig::serve(), "cesium/");
    let router = dev_router(&session, &project.options());

    let response = get(router, "/cesium/Widgets/widgets.css").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn test_mounted_below_app_base() {
    let project = Project::new();
    let session = Session::resolve(&HostConfig::serve().with_base("/app/"), "cesium/");

    let router = dev_router(&session, &project.options());
    let response = get(router, "/app/cesium/Assets/approximateTerrainHeights.json").await;
    assert_eq!(response.status(), StatusCode::OK);

    let router = dev_router(&session, &project.options());
    let response = get(router, "/cesium/Assets/approximateTerrainHeights.json").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_file_is_not_found() {
    let project = Project::new();
    let session = Session::resolve(&HostConfig::serve(), "cesium/");
    let router = dev_router(&session, &project.options());

    let response = get(router, "/cesium/Assets/nope.json").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_plugin_hook_serves_in_serve_mode() {
    let project = Project::new();
    let plugin = project.plugin();
    let session = plugin.resolve(&HostConfig::serve());

    let router = plugin.configure_server(&session).unwrap();
    let response = get(router, "/cesium/ThirdParty/draco_decoder.wasm").await;
    assert_eq!(response.status(), StatusCode::OK);
}
