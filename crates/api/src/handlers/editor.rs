//! Handlers for `/editor/sessions`: one storyboard editing session per
//! resource.
//!
//! Handlers only hold a session lock for quick reads and selection edits.
//! Video loading, generation and save go through the orchestrator, which
//! releases the lock while the media services work.

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use storysplice_core::data_uri::DataUri;
use storysplice_core::storyboard::ProvenanceRange;
use storysplice_db::models::project::Project;
use storysplice_media::models::VideoUpload;
use storysplice_pipeline::orchestrator::VideoOutcome;
use storysplice_pipeline::registry::SessionHandle;
use storysplice_pipeline::session::{EditorPhase, EditorSession};
use storysplice_pipeline::PipelineError;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DurationRequest {
    /// Video length in seconds as measured by the client.
    pub duration: f64,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub name: String,
}

/// One storyboard slot. Fetch the image at `url`.
#[derive(Debug, Serialize)]
pub struct FrameRef {
    pub index: usize,
    pub url: String,
    /// Inside a provenance range (AI-generated).
    pub generated: bool,
}

#[derive(Debug, Serialize)]
pub struct VideoRef {
    pub id: Uuid,
    pub content_type: String,
    pub url: String,
}

/// Everything a client needs to draw the editor.
#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub phase: EditorPhase,
    pub frames: Vec<FrameRef>,
    /// Selected indices, ascending.
    pub selection: Vec<usize>,
    /// Selected indices in the order they were picked.
    pub pick_order: Vec<usize>,
    pub provenance: Vec<ProvenanceRange>,
    pub prompt: String,
    pub video_duration: Option<f64>,
    pub video: Option<VideoRef>,
}

impl SessionSnapshot {
    pub fn of(session: &EditorSession) -> Self {
        let id = session.id();
        let storyboard = session.storyboard();
        let base = session_path(id);

        let frames = (0..storyboard.len())
            .map(|index| FrameRef {
                index,
                url: format!("{base}/frames/{index}"),
                generated: storyboard.is_provenance_at(index),
            })
            .collect();

        let video = session.displayed_video().map(|v| VideoRef {
            id: v.id,
            content_type: v.content_type.clone(),
            url: format!("{base}/video/{}", v.id),
        });

        Self {
            id,
            phase: session.phase(),
            frames,
            selection: storyboard.selection().indices().to_vec(),
            pick_order: storyboard.pick_order().to_vec(),
            provenance: storyboard.provenance().to_vec(),
            prompt: session.prompt().to_string(),
            video_duration: session.video_duration(),
            video,
        }
    }
}

/// Result of `POST /generate`.
#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub inserted: usize,
    pub range: ProvenanceRange,
    pub session: SessionSnapshot,
}

fn session_path(id: Uuid) -> String {
    format!("/api/v1/editor/sessions/{id}")
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

/// POST /api/v1/editor/sessions
pub async fn create_session(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<(StatusCode, Json<DataResponse<SessionSnapshot>>)> {
    let (_, handle) = state.sessions.create(auth.user_id).await;
    let snapshot = SessionSnapshot::of(&*handle.lock().await);
    Ok((StatusCode::CREATED, Json(DataResponse { data: snapshot })))
}

/// GET /api/v1/editor/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<SessionSnapshot>>> {
    let handle = session(&state, &auth, id).await?;
    snapshot(&handle).await
}

/// DELETE /api/v1/editor/sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.sessions.remove(id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Video
// ---------------------------------------------------------------------------

/// POST /api/v1/editor/sessions/{id}/video
///
/// Multipart form with a required `video` file and an optional `duration`
/// (seconds). With a duration, frames are extracted before responding;
/// otherwise extraction waits for `PUT /duration`.
pub async fn upload_video(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Json<DataResponse<SessionSnapshot>>> {
    let handle = session(&state, &auth, id).await?;

    let mut upload: Option<VideoUpload> = None;
    let mut duration: Option<f64> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "video" => {
                let file_name = field.file_name().unwrap_or("video.mp4").to_string();
                let content_type = field.content_type().unwrap_or("video/mp4").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                upload = Some(VideoUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "duration" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                let secs = text.trim().parse::<f64>().map_err(|_| {
                    AppError::BadRequest(format!("'duration' must be a number, got '{text}'"))
                })?;
                duration = Some(secs);
            }
            _ => {}
        }
    }

    let upload = upload
        .ok_or_else(|| PipelineError::Validation("Please upload a video first.".into()))?;
    tracing::info!(
        session_id = %id,
        file_name = %upload.file_name,
        bytes = upload.bytes.len(),
        duration,
        "Video received",
    );

    let outcome = state.orchestrator.load_video(&handle, upload, duration).await?;
    log_outcome(id, outcome);
    snapshot(&handle).await
}

/// PUT /api/v1/editor/sessions/{id}/duration
pub async fn report_duration(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<DurationRequest>,
) -> AppResult<Json<DataResponse<SessionSnapshot>>> {
    let handle = session(&state, &auth, id).await?;
    let outcome = state
        .orchestrator
        .report_duration(&handle, input.duration)
        .await?;
    log_outcome(id, outcome);
    snapshot(&handle).await
}

/// GET /api/v1/editor/sessions/{id}/video/{video_id}
///
/// Only the currently displayed video is served; superseded ids are gone.
pub async fn get_video(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, video_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let handle = session(&state, &auth, id).await?;
    let guard = handle.lock().await;
    let video = guard
        .displayed_video()
        .filter(|v| v.id == video_id)
        .ok_or_else(|| PipelineError::NotFound("Video not found.".into()))?;

    binary(video.bytes.clone(), &video.content_type)
}

/// GET /api/v1/editor/sessions/{id}/frames/{index}
pub async fn get_frame(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, index)): Path<(Uuid, usize)>,
) -> AppResult<Response> {
    let handle = session(&state, &auth, id).await?;
    let frame = handle
        .lock()
        .await
        .storyboard()
        .frame(index)
        .cloned()
        .ok_or_else(|| PipelineError::NotFound(format!("Frame {index} not found.")))?;

    let decoded = DataUri::parse(frame.as_str())?;
    binary(decoded.bytes, &decoded.mime)
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// POST /api/v1/editor/sessions/{id}/selection/{index}
pub async fn toggle_selection(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, index)): Path<(Uuid, usize)>,
) -> AppResult<Json<DataResponse<SessionSnapshot>>> {
    let handle = session(&state, &auth, id).await?;
    let mut guard = handle.lock().await;
    guard.toggle_select(index)?;
    Ok(Json(DataResponse {
        data: SessionSnapshot::of(&guard),
    }))
}

/// DELETE /api/v1/editor/sessions/{id}/selection
pub async fn clear_selection(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DataResponse<SessionSnapshot>>> {
    let handle = session(&state, &auth, id).await?;
    let mut guard = handle.lock().await;
    guard.clear_selection()?;
    Ok(Json(DataResponse {
        data: SessionSnapshot::of(&guard),
    }))
}

// ---------------------------------------------------------------------------
// Generation and save
// ---------------------------------------------------------------------------

/// POST /api/v1/editor/sessions/{id}/generate
pub async fn generate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<GenerateRequest>,
) -> AppResult<Json<DataResponse<GenerationResponse>>> {
    let handle = session(&state, &auth, id).await?;
    let outcome = state.orchestrator.generate(&handle, &input.prompt).await?;

    let session = SessionSnapshot::of(&*handle.lock().await);
    Ok(Json(DataResponse {
        data: GenerationResponse {
            inserted: outcome.inserted,
            range: outcome.range,
            session,
        },
    }))
}

/// POST /api/v1/editor/sessions/{id}/save
pub async fn save(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<SaveRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    let handle = session(&state, &auth, id).await?;
    let project = state.orchestrator.save(&handle, &input.name).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn session(state: &AppState, auth: &AuthUser, id: Uuid) -> AppResult<SessionHandle> {
    Ok(state.sessions.get(id, auth.user_id).await?)
}

async fn snapshot(handle: &SessionHandle) -> AppResult<Json<DataResponse<SessionSnapshot>>> {
    let data = SessionSnapshot::of(&*handle.lock().await);
    Ok(Json(DataResponse { data }))
}

fn log_outcome(id: Uuid, outcome: VideoOutcome) {
    match outcome {
        VideoOutcome::AwaitingDuration => {
            tracing::debug!(session_id = %id, "Waiting for video duration");
        }
        VideoOutcome::Extracted { frames } => {
            tracing::info!(session_id = %id, frames, "Storyboard extracted");
        }
    }
}

fn binary(bytes: Vec<u8>, content_type: &str) -> AppResult<Response> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "private, no-store")
        .body(Body::from(bytes))
        .map_err(|e| AppError::InternalError(format!("Failed to build response: {e}")))
}
