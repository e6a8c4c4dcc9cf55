//! Integration tests for the DAP routes
//!
//! These tests verify:
//! - DAS, DDS and DODS bodies for a Zarr store on disk
//! - Protocol headers and conditional GET
//! - DAP2 error bodies and status codes

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use dap_api::{config::DapConfig, router::build_router, state::AppState};
use dap_protocol::{DapError, DapResult, DatasetNode, DatasetResolver, Diagnostics};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

/// Test helper serving the sample store from a fresh temporary data root.
fn sample_app() -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    test_utils::write_sample_store(dir.path()).unwrap();

    let config = DapConfig {
        data_root: dir.path().to_path_buf(),
        build_revision: "test-rev".to_string(),
        secure_hostnames: vec!["data.example.org".to_string()],
        ..Default::default()
    };
    (build_router(Arc::new(AppState::new(config))), dir)
}

async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

#[tokio::test]
async fn test_dds_with_projection() {
    let (app, _dir) = sample_app();
    let response = get(app, "/dap/model/run.zarr.dds?temp%5B1:1:1%5D").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-description"], "dods-dds");
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert_eq!(response.headers()["xdods-server"], "dods/3.2.2");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "max-age=5");
    assert_eq!(response.headers()[header::VARY], "X-Auth-Roles");
    assert!(response.headers().contains_key(header::EXPIRES));

    let body = body_bytes(response).await;
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "dataset {\r\n    Float32 temp[time=1][x=2];\r\n} run.zarr;\r\n"
    );
}

#[tokio::test]
async fn test_dods_body() {
    let (app, _dir) = sample_app();
    let response = get(app, "/dap/model/run.zarr.dods?temp[1:1:1]").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-description"], "dods-data");
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/octet");

    let mut expected =
        b"dataset {\r\n    Float32 temp[time=1][x=2];\r\n} run.zarr;\r\n\nData:\n".to_vec();
    expected.extend_from_slice(&[0, 0, 0, 2, 0, 0, 0, 2]);
    expected.extend_from_slice(&3.0f32.to_be_bytes());
    expected.extend_from_slice(&4.0f32.to_be_bytes());
    assert_eq!(body_bytes(response).await, expected);
}

#[tokio::test]
async fn test_das_references_follow_forwarded_host() {
    let (app, _dir) = sample_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/dap/model/run.zarr.das")
                .header("x-forwarded-host", "data.example.org")
                .header("x-server-prefix", "/opendap")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-description"], "dods-das");

    let das = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(das.starts_with("attributes {\r\n"));
    assert!(das.contains(
        "    string references \"https://data.example.org/opendap/info/model/run.zarr.html\";\r\n"
    ));
    assert!(das.contains("    temp {\r\n        string units \"K\";\r\n"));
}

#[tokio::test]
async fn test_conditional_get() {
    let (app, _dir) = sample_app();
    let first = get(app.clone(), "/dap/model/run.zarr.das?key=abc").await;
    let etag = first.headers()[header::ETAG].clone();

    // Same URI with a different access key shares the tag.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/dap/model/run.zarr.das?key=xyz")
                .header(header::IF_NONE_MATCH, etag)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert!(response.headers().contains_key(header::ETAG));
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_unknown_variable_is_404_error_body() {
    let (app, _dir) = sample_app();
    let response = get(app, "/dap/model/run.zarr.dds?humidity").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["content-description"], "dods-error");
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert_eq!(
        body,
        "Error {\n    code = 404;\n    message = \"Unknown variable: humidity\";\n};\n"
    );
}

#[tokio::test]
async fn test_duplicate_projection_is_400() {
    let (app, _dir) = sample_app();
    let response = get(app, "/dap/model/run.zarr.dods?temp[0],temp[1]").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_traversal_is_403() {
    let (app, _dir) = sample_app();
    let response = get(app, "/dap/..%2F..%2Fetc%2Fpasswd.das").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.headers()["content-description"], "dods-error");
}

#[tokio::test]
async fn test_unknown_suffix_is_404() {
    let (app, _dir) = sample_app();
    let response = get(app, "/dap/model/run.zarr.html").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let (app, _dir) = sample_app();
    let response = get(app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["status"], "ok");
}

struct FailingResolver;

impl DatasetResolver for FailingResolver {
    fn resolve(&self, object_id: &str) -> DapResult<(DatasetNode, Diagnostics)> {
        Err(DapError::data_access(format!("{}: disk unavailable", object_id)))
    }
}

#[tokio::test]
async fn test_storage_failure_is_500() {
    let state = AppState::with_resolver(DapConfig::default(), Arc::new(FailingResolver));
    let app = build_router(Arc::new(state));

    let response = get(app, "/dap/any.zarr.dds").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("code = 500;"));
    assert!(body.contains("disk unavailable"));
}
