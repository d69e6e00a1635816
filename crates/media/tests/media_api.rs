//! Integration tests for `MediaApi` against an in-process mock service.

use assert_matches::assert_matches;
use axum::extract::{Multipart, Query};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;

use storysplice_media::api::MediaApi;
use storysplice_media::error::MediaApiError;
use storysplice_media::models::{ExtractOptions, InterpolationRequest, RenderRequest, VideoUpload};

/// Serve `router` on an ephemeral port and return its base URL.
async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn upload() -> VideoUpload {
    VideoUpload {
        file_name: "clip.mp4".into(),
        content_type: "video/mp4".into(),
        bytes: vec![0, 1, 2, 3],
    }
}

async fn extract_handler(
    Query(params): Query<HashMap<String, String>>,
    mut multipart: Multipart,
) -> Json<Value> {
    let mut field_name = String::new();
    let mut size = 0;
    while let Some(field) = multipart.next_field().await.unwrap() {
        field_name = field.name().unwrap_or_default().to_string();
        size = field.bytes().await.unwrap().len();
    }
    Json(json!({
        "frames": [
            format!("{field_name}:{size}"),
            params.get("quality").cloned().unwrap_or_default(),
            params.get("width").cloned().unwrap_or_default(),
        ]
    }))
}

#[tokio::test]
async fn extract_frames_sends_video_field_and_options() {
    let base = spawn(Router::new().route("/api/storyboard/extract-frames", post(extract_handler))).await;
    let api = MediaApi::new(base);

    let frames = api
        .extract_frames(&upload(), &ExtractOptions::default())
        .await
        .unwrap();

    assert_eq!(frames, vec!["video:4", "high", "1920"]);
}

#[tokio::test]
async fn extract_frames_surfaces_status_and_body() {
    let router = Router::new().route(
        "/api/storyboard/extract-frames",
        post(|| async { (StatusCode::UNPROCESSABLE_ENTITY, "unsupported codec") }),
    );
    let api = MediaApi::new(spawn(router).await);

    let err = api
        .extract_frames(&upload(), &ExtractOptions::default())
        .await
        .unwrap_err();

    assert_matches!(err, MediaApiError::Api { status: 422, ref body } if body == "unsupported codec");
}

#[tokio::test]
async fn non_json_success_is_a_contract_violation() {
    let router = Router::new().route(
        "/api/storyboard/extract-frames",
        post(|| async { "<html>ok</html>" }),
    );
    let api = MediaApi::new(spawn(router).await);

    let err = api
        .extract_frames(&upload(), &ExtractOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_contract_violation());
}

#[tokio::test]
async fn interpolation_posts_camel_case_body() {
    let router = Router::new().route(
        "/api/storyboard/generate-ai-video",
        post(|Json(body): Json<Value>| async move {
            Json(json!({
                "frames": [body["firstImage"], body["lastImage"], body["prompt"]],
                "videoUrl": "/outputs/v1.mp4",
            }))
        }),
    );
    let api = MediaApi::new(spawn(router).await);

    let request = InterpolationRequest::new("http://b/1.jpg".into(), "http://b/2.jpg".into(), "dusk".into());
    let result = api.generate_interpolation(&request).await.unwrap();

    assert_eq!(result.frames, vec!["http://b/1.jpg", "http://b/2.jpg", "dusk"]);
    assert_eq!(result.video_url.as_deref(), Some("/outputs/v1.mp4"));
}

#[tokio::test]
async fn interpolation_without_frames_is_rejected() {
    let router = Router::new().route(
        "/api/storyboard/generate-ai-video",
        post(|| async { Json(json!({"videoUrl": "/outputs/v1.mp4"})) }),
    );
    let api = MediaApi::new(spawn(router).await);

    let request = InterpolationRequest::new("a".into(), "b".into(), "p".into());
    let err = api.generate_interpolation(&request).await.unwrap_err();

    assert!(err.is_contract_violation());
}

#[tokio::test]
async fn render_follows_video_url_reply() {
    let router = Router::new()
        .route(
            "/api/storyboard/frames-to-video",
            post(|| async { Json(json!({"videoUrl": "/files/out.mp4"})) }),
        )
        .route(
            "/files/out.mp4",
            get(|| async { ([(header::CONTENT_TYPE, "video/mp4")], vec![9u8, 9, 9]) }),
        );
    let api = MediaApi::new(spawn(router).await);

    let video = api
        .render_video(&RenderRequest::final_export(vec!["f1".into()]))
        .await
        .unwrap();

    assert_eq!(video.bytes, vec![9, 9, 9]);
    assert_eq!(video.content_type, "video/mp4");
}

#[tokio::test]
async fn render_accepts_raw_video_reply() {
    let router = Router::new().route(
        "/api/storyboard/frames-to-video",
        post(|| async { ([(header::CONTENT_TYPE, "video/webm")], vec![1u8, 2]).into_response() }),
    );
    let api = MediaApi::new(spawn(router).await);

    let video = api
        .render_video(&RenderRequest::final_export(vec!["f1".into()]))
        .await
        .unwrap();

    assert_eq!(video.bytes, vec![1, 2]);
    assert_eq!(video.content_type, "video/webm");
}

#[tokio::test]
async fn render_ffmpeg_failure_is_classified() {
    let router = Router::new().route(
        "/api/storyboard/frames-to-video",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "FFmpeg process failed"})),
            )
        }),
    );
    let api = MediaApi::new(spawn(router).await);

    let err = api
        .render_video(&RenderRequest::final_export(vec![]))
        .await
        .unwrap_err();

    assert!(err.is_ffmpeg_failure());
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn unreachable_service_is_classified() {
    // Bind then drop to get a port nothing is listening on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = MediaApi::new(format!("http://{addr}"));
    let err = api
        .extract_frames(&upload(), &ExtractOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_unreachable());
}
