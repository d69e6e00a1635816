//! Collaborator seams used by the orchestrator.
//!
//! The three media ports are implemented by [`MediaApi`]; [`ProjectStore`]
//! by [`crate::store::PgProjectStore`]. Blob storage uses
//! [`storysplice_cloud::BlobStore`] directly.

use async_trait::async_trait;
use storysplice_core::storyboard::Frame;
use storysplice_core::types::DbId;
use storysplice_db::models::project::{CreateProject, Project, UpdateProject};
use storysplice_media::api::MediaApi;
use storysplice_media::error::MediaApiError;
use storysplice_media::models::{
    ExtractOptions, InterpolationRequest, InterpolationResult, RenderRequest, VideoBlob,
    VideoUpload,
};

/// Video in, ordered frames out.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    async fn extract(&self, video: &VideoUpload) -> Result<Vec<Frame>, MediaApiError>;
}

/// Two anchor frames plus a prompt in, in-between frames out.
#[async_trait]
pub trait FrameInterpolator: Send + Sync {
    async fn interpolate(
        &self,
        request: &InterpolationRequest,
    ) -> Result<InterpolationResult, MediaApiError>;

    /// Fetch the replacement video named by an interpolation result.
    async fn fetch_video(&self, url: &str) -> Result<VideoBlob, MediaApiError>;
}

/// Whole storyboard in, final video out.
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    async fn render(&self, frames: &[Frame]) -> Result<VideoBlob, MediaApiError>;
}

/// Record store failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied(_) => "Access denied. Check the project store permissions.",
            Self::Database(_) => "Failed to save the project. Please try again.",
        }
    }
}

/// Queryable project records keyed by owner.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn create(&self, input: &CreateProject) -> Result<Project, StoreError>;

    async fn find(&self, id: DbId) -> Result<Option<Project>, StoreError>;

    /// Newest first.
    async fn list_by_owner(
        &self,
        owner_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Project>, StoreError>;

    async fn count_by_owner(&self, owner_id: DbId) -> Result<i64, StoreError>;

    async fn update(&self, id: DbId, input: &UpdateProject)
        -> Result<Option<Project>, StoreError>;

    async fn delete(&self, id: DbId) -> Result<bool, StoreError>;
}

// ---------------------------------------------------------------------------
// MediaApi adapters
// ---------------------------------------------------------------------------

#[async_trait]
impl FrameExtractor for MediaApi {
    async fn extract(&self, video: &VideoUpload) -> Result<Vec<Frame>, MediaApiError> {
        let frames = self
            .extract_frames(video, &ExtractOptions::default())
            .await?;
        Ok(frames.into_iter().map(Frame::from).collect())
    }
}

#[async_trait]
impl FrameInterpolator for MediaApi {
    async fn interpolate(
        &self,
        request: &InterpolationRequest,
    ) -> Result<InterpolationResult, MediaApiError> {
        self.generate_interpolation(request).await
    }

    async fn fetch_video(&self, url: &str) -> Result<VideoBlob, MediaApiError> {
        self.download(url).await
    }
}

#[async_trait]
impl VideoRenderer for MediaApi {
    async fn render(&self, frames: &[Frame]) -> Result<VideoBlob, MediaApiError> {
        let encoded = frames.iter().map(|f| f.as_str().to_string()).collect();
        self.render_video(&RenderRequest::final_export(encoded)).await
    }
}
