//! In-memory collaborators for tests.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use storysplice_cloud::{validate_key, BlobStore, StorageError, StorageErrorCode, StoredBlob};
use storysplice_core::data_uri;
use storysplice_core::storyboard::Frame;
use storysplice_core::types::DbId;
use storysplice_db::models::project::{CreateProject, Project, UpdateProject};
use storysplice_media::error::MediaApiError;
use storysplice_media::models::{InterpolationRequest, InterpolationResult, VideoBlob, VideoUpload};

use crate::ports::{FrameExtractor, FrameInterpolator, ProjectStore, StoreError, VideoRenderer};

/// A decodable PNG frame as a data URI.
pub fn solid_frame(width: u32, height: u32, rgb: [u8; 3]) -> String {
    let img = RgbImage::from_pixel(width, height, Rgb(rgb));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode PNG");
    data_uri::encode("image/png", &out.into_inner())
}

/// `n` distinct decodable frames.
pub fn sample_frames(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| solid_frame(16, 9, [(i * 20 % 256) as u8, 40, 90]))
        .collect()
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

/// Canned failure for one fake media operation.
#[derive(Debug, Clone)]
pub enum FakeFailure {
    Status(u16, String),
    Contract(String),
}

impl FakeFailure {
    fn into_error(self) -> MediaApiError {
        match self {
            Self::Status(status, body) => MediaApiError::Api { status, body },
            Self::Contract(detail) => MediaApiError::Contract(detail),
        }
    }
}

/// Scriptable stand-in for all three media services.
///
/// Operation names for [`FakeMedia::fail`]: `extract`, `interpolate`,
/// `fetch_video`, `render`.
pub struct FakeMedia {
    extracted: Mutex<Vec<String>>,
    interpolated: Mutex<Vec<String>>,
    video_url: Mutex<Option<String>>,
    failures: Mutex<HashMap<&'static str, FakeFailure>>,
    stalled: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<&'static str>>,
    last_interpolation: Mutex<Option<InterpolationRequest>>,
    last_render: Mutex<Option<Vec<Frame>>>,
}

impl Default for FakeMedia {
    fn default() -> Self {
        Self {
            extracted: Mutex::new(sample_frames(4)),
            interpolated: Mutex::new(vec!["data:image/jpeg;base64,AA==".into(); 2]),
            video_url: Mutex::new(Some("/outputs/generated.mp4".into())),
            failures: Mutex::new(HashMap::new()),
            stalled: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            last_interpolation: Mutex::new(None),
            last_render: Mutex::new(None),
        }
    }
}

impl FakeMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_extracted(&self, frames: Vec<String>) {
        *self.extracted.lock().unwrap() = frames;
    }

    pub fn set_interpolated(&self, frames: Vec<String>, video_url: Option<String>) {
        *self.interpolated.lock().unwrap() = frames;
        *self.video_url.lock().unwrap() = video_url;
    }

    pub fn fail(&self, operation: &'static str, failure: FakeFailure) {
        self.failures.lock().unwrap().insert(operation, failure);
    }

    /// Make `operation` hang forever once called, like a service that never answers.
    pub fn stall(&self, operation: &'static str) {
        self.stalled.lock().unwrap().insert(operation);
    }

    pub fn resume(&self, operation: &'static str) {
        self.stalled.lock().unwrap().remove(operation);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_interpolation(&self) -> Option<InterpolationRequest> {
        self.last_interpolation.lock().unwrap().clone()
    }

    pub fn last_render(&self) -> Option<Vec<Frame>> {
        self.last_render.lock().unwrap().clone()
    }

    fn record(&self, operation: &'static str) -> Result<(), MediaApiError> {
        self.calls.lock().unwrap().push(operation);
        match self.failures.lock().unwrap().get(operation) {
            Some(failure) => Err(failure.clone().into_error()),
            None => Ok(()),
        }
    }

    async fn enter(&self, operation: &'static str) -> Result<(), MediaApiError> {
        self.record(operation)?;
        let stalled = self.stalled.lock().unwrap().contains(operation);
        if stalled {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

#[async_trait]
impl FrameExtractor for FakeMedia {
    async fn extract(&self, _video: &VideoUpload) -> Result<Vec<Frame>, MediaApiError> {
        self.enter("extract").await?;
        Ok(self.extracted.lock().unwrap().iter().map(|f| Frame::new(f.clone())).collect())
    }
}

#[async_trait]
impl FrameInterpolator for FakeMedia {
    async fn interpolate(
        &self,
        request: &InterpolationRequest,
    ) -> Result<InterpolationResult, MediaApiError> {
        *self.last_interpolation.lock().unwrap() = Some(request.clone());
        self.enter("interpolate").await?;
        Ok(InterpolationResult {
            frames: self.interpolated.lock().unwrap().clone(),
            video_url: self.video_url.lock().unwrap().clone(),
        })
    }

    async fn fetch_video(&self, _url: &str) -> Result<VideoBlob, MediaApiError> {
        self.enter("fetch_video").await?;
        Ok(VideoBlob {
            bytes: b"generated-video".to_vec(),
            content_type: "video/mp4".into(),
        })
    }
}

#[async_trait]
impl VideoRenderer for FakeMedia {
    async fn render(&self, frames: &[Frame]) -> Result<VideoBlob, MediaApiError> {
        *self.last_render.lock().unwrap() = Some(frames.to_vec());
        self.enter("render").await?;
        Ok(VideoBlob {
            bytes: b"final-video".to_vec(),
            content_type: "video/mp4".into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Blobs
// ---------------------------------------------------------------------------

/// Blob store holding everything in a map. URLs use `memory://`.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, (Vec<u8>, String)>>,
    deny_writes: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `put` fail with `storage/unauthorized`.
    pub fn deny_writes(&self) {
        self.deny_writes.store(true, Ordering::SeqCst);
    }

    pub fn get(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.blobs.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.blobs.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredBlob, StorageError> {
        validate_key(key)?;
        if self.deny_writes.load(Ordering::SeqCst) {
            return Err(StorageError::new(StorageErrorCode::Unauthorized, "writes denied"));
        }
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(StoredBlob {
            key: key.to_string(),
            url: self.url_for(key),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match self.blobs.lock().unwrap().remove(key) {
            Some(_) => Ok(()),
            None => Err(StorageError::new(StorageErrorCode::NotFound, key)),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("memory://{key}")
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryProjectStore {
    projects: Mutex<Vec<Project>>,
    next_id: AtomicI64,
    deny_writes: AtomicBool,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny_writes(&self) {
        self.deny_writes.store(true, Ordering::SeqCst);
    }

    pub fn all(&self) -> Vec<Project> {
        self.projects.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn create(&self, input: &CreateProject) -> Result<Project, StoreError> {
        if self.deny_writes.load(Ordering::SeqCst) {
            return Err(StoreError::PermissionDenied("writes denied".into()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        // Offset timestamps by id so newest-first ordering is deterministic.
        let now = chrono::Utc::now() + chrono::Duration::milliseconds(id);
        let project = Project {
            id,
            owner_id: input.owner_id,
            name: input.name.clone(),
            duration: input.duration.clone(),
            video_url: input.video_url.clone(),
            video_key: input.video_key.clone(),
            thumbnail_url: input.thumbnail_url.clone(),
            thumbnail_key: input.thumbnail_key.clone(),
            created_at: now,
            updated_at: now,
        };
        self.projects.lock().unwrap().push(project.clone());
        Ok(project)
    }

    async fn find(&self, id: DbId) -> Result<Option<Project>, StoreError> {
        Ok(self.projects.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn list_by_owner(
        &self,
        owner_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Project>, StoreError> {
        let mut owned: Vec<Project> = self
            .projects
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(owned
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_by_owner(&self, owner_id: DbId) -> Result<i64, StoreError> {
        let count = self
            .projects
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .count();
        Ok(count as i64)
    }

    async fn update(
        &self,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, StoreError> {
        let mut projects = self.projects.lock().unwrap();
        let Some(project) = projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            project.name = name.clone();
        }
        if let Some(duration) = &input.duration {
            project.duration = duration.clone();
        }
        project.updated_at = chrono::Utc::now();
        Ok(Some(project.clone()))
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        let mut projects = self.projects.lock().unwrap();
        let before = projects.len();
        projects.retain(|p| p.id != id);
        Ok(projects.len() < before)
    }
}
