//! Router-level tests driven through `tower::ServiceExt::oneshot`.

use std::io::Read;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use flate2::read::GzDecoder;
use grid_api::{router, state::AppState};
use grid_common::GridName;
use storage::GridStore;
use test_utils::{sample_current_record, sample_landmask_record, write_grid_record};
use tower::ServiceExt;

fn app(dir: &std::path::Path) -> Router {
    router(Arc::new(AppState::with_store(GridStore::new(dir))))
}

async fn get(app: Router, uri: &str, accept_encoding: Option<&str>) -> Response {
    let mut request = Request::builder().uri(uri);
    if let Some(accept) = accept_encoding {
        request = request.header(header::ACCEPT_ENCODING, accept);
    }
    app.oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_grid_status() {
    let dir = tempfile::tempdir().unwrap();
    write_grid_record(dir.path(), GridName::Landmask, &sample_landmask_record());

    let response = get(app(dir.path()), "/api/grid-status", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["landmask"], true);
    assert_eq!(json["wind"], false);
    assert_eq!(json["current"], false);
    assert_eq!(json["temperature"], false);
}

#[tokio::test]
async fn test_unknown_grid_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let response = get(app(dir.path()), "/api/grid/ozone", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["status"], 404);
    assert!(json["error"].as_str().unwrap().contains("ozone"));
}

#[tokio::test]
async fn test_absent_grid_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let response = get(app(dir.path()), "/api/grid/current", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_grid_identity_response() {
    let dir = tempfile::tempdir().unwrap();
    let written = write_grid_record(dir.path(), GridName::Current, &sample_current_record());

    let response = get(app(dir.path()), "/api/grid/current", Some("identity")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::CONTENT_ENCODING).is_none());
    assert_eq!(
        response.headers()[header::CONTENT_LENGTH],
        written.len().to_string().as_str()
    );
    assert_eq!(response.headers()[header::VARY], "Accept-Encoding");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=3600");

    assert_eq!(body_bytes(response).await, written);
}

#[tokio::test]
async fn test_grid_gzip_response() {
    let dir = tempfile::tempdir().unwrap();
    let written = write_grid_record(dir.path(), GridName::Current, &sample_current_record());

    let response = get(app(dir.path()), "/api/grid/current", Some("gzip, deflate")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");
    assert_eq!(response.headers()[header::VARY], "Accept-Encoding");

    let content_length: usize = response.headers()[header::CONTENT_LENGTH]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(
        response.headers().get_all(header::CONTENT_LENGTH).iter().count(),
        1
    );

    let compressed = body_bytes(response).await;
    assert_eq!(compressed.len(), content_length);
    let mut decoded = Vec::new();
    GzDecoder::new(&compressed[..])
        .read_to_end(&mut decoded)
        .unwrap();
    assert_eq!(decoded, written);
}

#[tokio::test]
async fn test_scenarios() {
    let dir = tempfile::tempdir().unwrap();
    let response = get(app(dir.path()), "/api/scenarios", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let scenarios = json.as_array().unwrap();
    assert_eq!(scenarios.len(), 4);
    assert_eq!(scenarios[3]["spillMode"], "continuous");
}

#[tokio::test]
async fn test_environment_defaults_to_time_zero() {
    let dir = tempfile::tempdir().unwrap();
    let json = body_json(get(app(dir.path()), "/api/environment", None).await).await;

    assert_eq!(json["wind"]["speed"], 5.0);
    assert_eq!(json["wind"]["direction"], 180.0);
    assert_eq!(json["current"]["direction"], 110.0);
    assert_eq!(json["temperature"], 18.0);
    assert_eq!(json["waveHeight"], 0.5);
}

#[tokio::test]
async fn test_environment_at_time() {
    let dir = tempfile::tempdir().unwrap();
    let json = body_json(get(app(dir.path()), "/api/environment?time=3600", None).await).await;
    let expected = 5.0 + 3.0 * (3.6f64).sin();
    assert!((json["wind"]["speed"].as_f64().unwrap() - expected).abs() < 1e-9);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let json = body_json(get(app(dir.path()), "/health", None).await).await;
    assert_eq!(json["status"], "ok");

    let response = get(app(dir.path()), "/metrics", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("grid_cache_misses_total"));
}
