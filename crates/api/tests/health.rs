//! Tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_bytes, body_json, get};

#[tokio::test]
async fn health_reports_version_and_sessions() {
    let app = common::build_memory_app();
    let response = get(&app.router, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["version"].is_string());
    assert!(json["db_healthy"].is_boolean());
    assert_eq!(json["editor_sessions"], 0);
}

#[tokio::test]
async fn health_is_degraded_without_database() {
    let app = common::build_memory_app();
    let json = body_json(get(&app.router, "/health").await).await;

    assert_eq!(json["status"], "degraded");
    assert_eq!(json["db_healthy"], false);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = common::build_memory_app();
    let response = get(&app.router, "/this-route-does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = common::build_memory_app();
    let response = get(&app.router, "/health").await;

    let id = response
        .headers()
        .get("x-request-id")
        .expect("x-request-id header")
        .to_str()
        .unwrap();
    assert_eq!(id.len(), 36);
}

#[tokio::test]
async fn cors_preflight_allows_dev_origin() {
    let app = common::build_memory_app();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/editor/sessions")
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "authorization")
        .body(Body::empty())
        .unwrap();

    let response = common::send(&app.router, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:5173"
    );
}

#[tokio::test]
async fn local_blobs_are_served() {
    let app = common::build_memory_app();
    let dir = app.blob_dir.path().join("thumbnails/7");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("a_thumbnail.jpg"), b"jpeg-bytes").unwrap();

    let response = get(&app.router, "/blobs/thumbnails/7/a_thumbnail.jpg").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"jpeg-bytes");
}
