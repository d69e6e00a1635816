//! Drives editor sessions through extraction, generation and save.
//!
//! Every operation follows the same shape: lock the session briefly to
//! take a ticket, run the network steps unlocked, then lock again to apply
//! the result or abort. The storyboard only changes after every network
//! step has succeeded.

use std::sync::Arc;

use chrono::Utc;
use storysplice_cloud::{BlobStore, StoredBlob};
use storysplice_core::data_uri::DataUri;
use storysplice_core::project::{
    final_video_file_name, format_duration, frame_key, thumbnail_key, video_key,
};
use storysplice_core::storyboard::{Frame, ProvenanceRange};
use storysplice_core::thumbnail::{render_thumbnail, to_jpeg, THUMBNAIL_MIME};
use storysplice_core::types::DbId;
use storysplice_db::models::project::{CreateProject, Project};
use storysplice_media::models::{InterpolationRequest, VideoUpload};
use uuid::Uuid;

use crate::error::{MediaStep, PipelineError};
use crate::ports::{FrameExtractor, FrameInterpolator, ProjectStore, VideoRenderer};
use crate::registry::SessionHandle;
use crate::session::{DisplayedVideo, EditorAction, GenerationTicket, SaveTicket};

/// JPEG quality for anchor frames sent to the interpolation service.
const ANCHOR_JPEG_QUALITY: u8 = 90;

/// Frame rate used to estimate duration when the client never reported one.
const FALLBACK_FPS: f64 = 30.0;

/// The external collaborators an [`Orchestrator`] drives.
#[derive(Clone)]
pub struct Collaborators {
    pub extractor: Arc<dyn FrameExtractor>,
    pub interpolator: Arc<dyn FrameInterpolator>,
    pub renderer: Arc<dyn VideoRenderer>,
    pub blobs: Arc<dyn BlobStore>,
    pub projects: Arc<dyn ProjectStore>,
}

/// What a video upload or duration report led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoOutcome {
    /// Waiting for the client to report the duration.
    AwaitingDuration,
    /// Extraction ran; the storyboard now has this many frames.
    Extracted { frames: usize },
}

/// Summary of one successful generation round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    pub range: ProvenanceRange,
    pub inserted: usize,
    pub total_frames: usize,
    /// Handle of the replacement video, when the service rendered one.
    pub video_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct Orchestrator {
    ports: Collaborators,
}

impl Orchestrator {
    pub fn new(ports: Collaborators) -> Self {
        Self { ports }
    }

    pub fn projects(&self) -> &Arc<dyn ProjectStore> {
        &self.ports.projects
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.ports.blobs
    }

    // ---- video and extraction ----

    /// Accept a new video and extract frames if its duration is known.
    pub async fn load_video(
        &self,
        session: &SessionHandle,
        upload: VideoUpload,
        duration: Option<f64>,
    ) -> Result<VideoOutcome, PipelineError> {
        let action = session.lock().await.load_video(upload, duration)?;
        self.follow(session, action).await
    }

    /// Record the duration of the loaded video and extract frames.
    pub async fn report_duration(
        &self,
        session: &SessionHandle,
        secs: f64,
    ) -> Result<VideoOutcome, PipelineError> {
        let action = session.lock().await.report_duration(secs)?;
        self.follow(session, action).await
    }

    async fn follow(
        &self,
        session: &SessionHandle,
        action: EditorAction,
    ) -> Result<VideoOutcome, PipelineError> {
        match action {
            EditorAction::None => Ok(VideoOutcome::AwaitingDuration),
            EditorAction::RequestExtraction => {
                let frames = self.extract(session).await?;
                Ok(VideoOutcome::Extracted { frames })
            }
        }
    }

    /// Send the session's video for extraction and load the frames.
    pub async fn extract(&self, session: &SessionHandle) -> Result<usize, PipelineError> {
        let (session_id, ticket) = {
            let mut guard = session.lock().await;
            (guard.id(), guard.begin_extraction()?)
        };
        let mut busy = BusyGuard::arm(session);
        tracing::info!(%session_id, file_name = %ticket.video.file_name, "Extracting storyboard frames");

        let result = self.ports.extractor.extract(&ticket.video).await;

        let mut guard = session.lock().await;
        busy.disarm();
        let frames = match result {
            Ok(frames) if frames.is_empty() => {
                guard.abort();
                return Err(PipelineError::media(
                    MediaStep::Extraction,
                    storysplice_media::error::MediaApiError::Contract(
                        "the service returned no frames".into(),
                    ),
                ));
            }
            Ok(frames) => frames,
            Err(e) => {
                guard.abort();
                tracing::warn!(%session_id, error = %e, "Frame extraction failed");
                return Err(PipelineError::media(MediaStep::Extraction, e));
            }
        };
        let count = guard.complete_extraction(frames)?;
        tracing::info!(%session_id, frames = count, "Storyboard loaded");
        Ok(count)
    }

    // ---- generation ----

    /// Generate frames between the two selected anchors and splice them in.
    pub async fn generate(
        &self,
        session: &SessionHandle,
        prompt: &str,
    ) -> Result<GenerationOutcome, PipelineError> {
        let (session_id, owner_id, ticket) = {
            let mut guard = session.lock().await;
            let ticket = guard.begin_generation(prompt)?;
            (guard.id(), guard.owner_id(), ticket)
        };
        let mut busy = BusyGuard::arm(session);
        tracing::info!(
            %session_id,
            start = ticket.start,
            end = ticket.end,
            "Requesting interpolated frames",
        );

        let result = self.run_generation(owner_id, &ticket).await;

        let mut guard = session.lock().await;
        busy.disarm();
        let (frames, video) = match result {
            Ok(output) => output,
            Err(e) => {
                guard.abort();
                tracing::warn!(%session_id, error = %e, "Generation failed");
                return Err(e);
            }
        };

        let inserted = frames.len();
        let applied = guard.complete_generation(&ticket, frames, video)?;
        if let Some(old) = applied.superseded_video {
            tracing::debug!(%session_id, video_id = %old, "Displayed video released");
        }
        tracing::info!(
            %session_id,
            inserted,
            total = applied.total_frames,
            "Generated frames spliced into storyboard",
        );

        Ok(GenerationOutcome {
            range: applied.range,
            inserted,
            total_frames: applied.total_frames,
            video_id: applied.video_id,
        })
    }

    async fn run_generation(
        &self,
        owner_id: DbId,
        ticket: &GenerationTicket,
    ) -> Result<(Vec<Frame>, Option<DisplayedVideo>), PipelineError> {
        let ts = Utc::now().timestamp_millis();
        let (first, last) = futures::try_join!(
            self.upload_anchor(&ticket.first_frame, frame_key(owner_id, ts, "first_frame")),
            self.upload_anchor(&ticket.last_frame, frame_key(owner_id, ts, "last_frame")),
        )?;

        let request = InterpolationRequest::new(first.url, last.url, ticket.prompt.clone());
        let result = self
            .ports
            .interpolator
            .interpolate(&request)
            .await
            .map_err(|e| PipelineError::media(MediaStep::Interpolation, e))?;

        let video = match result.video_url {
            Some(url) => {
                let blob = self
                    .ports
                    .interpolator
                    .fetch_video(&url)
                    .await
                    .map_err(|e| PipelineError::media(MediaStep::Interpolation, e))?;
                Some(DisplayedVideo::new(blob.bytes, blob.content_type))
            }
            None => None,
        };

        let frames = result.frames.into_iter().map(Frame::from).collect();
        Ok((frames, video))
    }

    /// Re-encode an anchor frame as JPEG and upload it so the service can fetch it.
    async fn upload_anchor(&self, frame: &Frame, key: String) -> Result<StoredBlob, PipelineError> {
        let decoded = DataUri::parse(frame.as_str())?;
        let jpeg = to_jpeg(&decoded.bytes, ANCHOR_JPEG_QUALITY)?;
        Ok(self.ports.blobs.put(&key, jpeg, "image/jpeg").await?)
    }

    // ---- save ----

    /// Render the whole storyboard and persist it as a project.
    pub async fn save(
        &self,
        session: &SessionHandle,
        name: &str,
    ) -> Result<Project, PipelineError> {
        let (session_id, owner_id, ticket) = {
            let mut guard = session.lock().await;
            let ticket = guard.begin_save(name)?;
            (guard.id(), guard.owner_id(), ticket)
        };
        let mut busy = BusyGuard::arm(session);
        tracing::info!(%session_id, name = %ticket.name, frames = ticket.frames.len(), "Saving project");

        let result = self.run_save(owner_id, &ticket).await;

        let mut guard = session.lock().await;
        busy.disarm();
        match result {
            Ok(project) => {
                guard.complete_save()?;
                tracing::info!(%session_id, project_id = project.id, "Project saved");
                Ok(project)
            }
            Err(e) => {
                guard.abort();
                tracing::warn!(%session_id, error = %e, "Save failed");
                Err(e)
            }
        }
    }

    async fn run_save(&self, owner_id: DbId, ticket: &SaveTicket) -> Result<Project, PipelineError> {
        let video = self
            .ports
            .renderer
            .render(&ticket.frames)
            .await
            .map_err(|e| PipelineError::media(MediaStep::Rendering, e))?;

        let ts = Utc::now().timestamp_millis();
        let file_name = final_video_file_name(&ticket.name, ts);
        let video_blob = self
            .ports
            .blobs
            .put(&video_key(owner_id, ts, &file_name), video.bytes, &video.content_type)
            .await?;

        let thumbnail = self.upload_thumbnail(owner_id, ts, ticket.frames.first()).await;

        let duration_secs = ticket
            .duration_secs
            .unwrap_or(ticket.frames.len() as f64 / FALLBACK_FPS);

        let input = CreateProject {
            owner_id,
            name: ticket.name.clone(),
            duration: format_duration(duration_secs),
            video_url: video_blob.url,
            video_key: video_blob.key,
            thumbnail_url: thumbnail.as_ref().map(|b| b.url.clone()),
            thumbnail_key: thumbnail.as_ref().map(|b| b.key.clone()),
        };

        match self.ports.projects.create(&input).await {
            Ok(project) => Ok(project),
            Err(e) => {
                self.discard_blob(&input.video_key).await;
                if let Some(key) = &input.thumbnail_key {
                    self.discard_blob(key).await;
                }
                Err(e.into())
            }
        }
    }

    /// Thumbnails are optional: any failure is logged and the project is
    /// saved without one.
    async fn upload_thumbnail(
        &self,
        owner_id: DbId,
        ts: i64,
        frame: Option<&Frame>,
    ) -> Option<StoredBlob> {
        let frame = frame?;
        let rendered = DataUri::parse(frame.as_str())
            .and_then(|uri| render_thumbnail(&uri.bytes));
        let jpeg = match rendered {
            Ok(jpeg) => jpeg,
            Err(e) => {
                tracing::warn!(owner_id, error = %e, "Thumbnail rendering failed");
                return None;
            }
        };
        match self
            .ports
            .blobs
            .put(&thumbnail_key(owner_id, ts), jpeg, THUMBNAIL_MIME)
            .await
        {
            Ok(blob) => Some(blob),
            Err(e) => {
                tracing::warn!(owner_id, error = %e, "Thumbnail upload failed");
                None
            }
        }
    }

    // ---- projects ----

    /// Delete an owned project: blobs first (best effort), then the record.
    pub async fn delete_project(&self, owner_id: DbId, project_id: DbId) -> Result<(), PipelineError> {
        let project = self
            .ports
            .projects
            .find(project_id)
            .await?
            .filter(|p| p.owner_id == owner_id)
            .ok_or_else(|| PipelineError::NotFound("Project not found.".into()))?;

        self.discard_blob(&project.video_key).await;
        if let Some(key) = &project.thumbnail_key {
            self.discard_blob(key).await;
        }

        self.ports.projects.delete(project.id).await?;
        tracing::info!(owner_id, project_id, "Project deleted");
        Ok(())
    }

    async fn discard_blob(&self, key: &str) {
        if let Err(e) = self.ports.blobs.delete(key).await {
            tracing::warn!(key, error = %e, "Failed to delete blob");
        }
    }
}

/// Returns a session to idle when an in-flight operation is dropped before
/// it could apply or abort, e.g. on client disconnect or request timeout.
struct BusyGuard {
    session: Option<SessionHandle>,
}

impl BusyGuard {
    fn arm(session: &SessionHandle) -> Self {
        Self {
            session: Some(Arc::clone(session)),
        }
    }

    /// The caller holds the lock and will apply or abort itself.
    fn disarm(&mut self) {
        self.session = None;
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        // Busy phases block new tickets: the phase still belongs to the
        // dropped operation.
        if let Ok(mut guard) = session.try_lock() {
            tracing::warn!(session_id = %guard.id(), phase = ?guard.phase(), "Operation dropped, session released");
            guard.abort();
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    let mut guard = session.lock().await;
                    tracing::warn!(session_id = %guard.id(), phase = ?guard.phase(), "Operation dropped, session released");
                    guard.abort();
                });
            }
            Err(_) => tracing::error!("Operation dropped outside a runtime, session left busy"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
