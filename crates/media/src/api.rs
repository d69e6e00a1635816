//! REST client for the media service endpoints.
//!
//! Wraps frame extraction, AI interpolation and frames-to-video rendering
//! using [`reqwest`]. All endpoints live under `{base}/api/storyboard`.

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};

use crate::config::MediaConfig;
use crate::error::MediaApiError;
use crate::models::{
    parse_extracted_frames, parse_interpolation, parse_video_url, ExtractOptions,
    InterpolationRequest, InterpolationResult, RenderRequest, VideoBlob, VideoUpload,
    DEFAULT_VIDEO_MIME,
};

/// Path prefix shared by every media endpoint.
const ROUTE_PREFIX: &str = "/api/storyboard";

/// HTTP client for one media service deployment.
#[derive(Debug, Clone)]
pub struct MediaApi {
    client: reqwest::Client,
    base_url: String,
}

impl MediaApi {
    /// Create a new client.
    ///
    /// * `base_url` - e.g. `http://host:8080` (trailing `/` is trimmed).
    pub fn new(base_url: String) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build a client from [`MediaConfig`], applying its request timeout.
    pub fn from_config(config: &MediaConfig) -> Result<Self, MediaApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config.base_url.clone()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Turn a service-relative URL (`/files/x.mp4`) into an absolute one.
    /// Absolute URLs pass through unchanged.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with('/') {
            format!("{}{url}", self.base_url)
        } else {
            url.to_string()
        }
    }

    /// Split an uploaded video into an ordered list of frame data URIs.
    ///
    /// Sends `POST /extract-frames?quality&width&height` with the video as
    /// the multipart field `video`.
    pub async fn extract_frames(
        &self,
        video: &VideoUpload,
        options: &ExtractOptions,
    ) -> Result<Vec<String>, MediaApiError> {
        let part = Part::bytes(video.bytes.clone())
            .file_name(video.file_name.clone())
            .mime_str(&video.content_type)?;
        let form = Form::new().part("video", part);

        tracing::debug!(
            file_name = %video.file_name,
            size_bytes = video.bytes.len(),
            "Sending video for frame extraction",
        );

        let response = self
            .client
            .post(self.endpoint("/extract-frames"))
            .query(options)
            .multipart(form)
            .send()
            .await?;

        let value = Self::parse_json(response).await?;
        let frames = parse_extracted_frames(value)?;
        tracing::info!(frames = frames.len(), "Frames extracted");
        Ok(frames)
    }

    /// Ask the interpolation service for in-between frames.
    ///
    /// Sends `POST /generate-ai-video`. The response must carry a `frames`
    /// array; `videoUrl` is optional and returned as-is (possibly relative).
    pub async fn generate_interpolation(
        &self,
        request: &InterpolationRequest,
    ) -> Result<InterpolationResult, MediaApiError> {
        let response = self
            .client
            .post(self.endpoint("/generate-ai-video"))
            .json(request)
            .send()
            .await?;

        let value = Self::parse_json(response).await?;
        let result = parse_interpolation(value)?;
        tracing::info!(
            frames = result.frames.len(),
            has_video = result.video_url.is_some(),
            "Interpolation finished",
        );
        Ok(result)
    }

    /// Render a frame sequence into a video.
    ///
    /// Sends `POST /frames-to-video`. A JSON reply carries `videoUrl`, which
    /// is then downloaded; any other reply is the video itself.
    pub async fn render_video(&self, request: &RenderRequest) -> Result<VideoBlob, MediaApiError> {
        tracing::debug!(frames = request.frames.len(), "Rendering frames to video");

        let response = self
            .client
            .post(self.endpoint("/frames-to-video"))
            .json(request)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        if is_json(&response) {
            let value: serde_json::Value = response
                .json()
                .await
                .map_err(|e| MediaApiError::Contract(format!("invalid JSON body: {e}")))?;
            let url = parse_video_url(&value)?;
            return self.download(&url).await;
        }

        Self::read_video(response).await
    }

    /// Fetch a video by URL, resolving service-relative paths first.
    pub async fn download(&self, url: &str) -> Result<VideoBlob, MediaApiError> {
        let resolved = self.resolve_url(url);
        tracing::debug!(url = %resolved, "Downloading rendered video");

        let response = self.client.get(&resolved).send().await?;
        let response = Self::ensure_success(response).await?;
        Self::read_video(response).await
    }

    // ---- private helpers ----

    fn endpoint(&self, path: &str) -> String {
        format!("{}{ROUTE_PREFIX}{path}", self.base_url)
    }

    /// Ensure the response has a success status code, otherwise capture the
    /// status and body in a [`MediaApiError::Api`].
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, MediaApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(MediaApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful response body as JSON. A body that is not JSON is
    /// a contract violation, not a transport failure.
    async fn parse_json(response: reqwest::Response) -> Result<serde_json::Value, MediaApiError> {
        let response = Self::ensure_success(response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| MediaApiError::Contract(format!("invalid JSON body: {e}")))
    }

    async fn read_video(response: reqwest::Response) -> Result<VideoBlob, MediaApiError> {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("video/"))
            .unwrap_or(DEFAULT_VIDEO_MIME)
            .to_string();
        let bytes = response.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(MediaApiError::Contract("video body is empty".to_string()));
        }
        Ok(VideoBlob {
            bytes,
            content_type,
        })
    }
}

fn is_json(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}
