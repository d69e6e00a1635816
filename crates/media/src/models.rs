//! Request and response shapes for the media endpoints.
//!
//! Field names follow the services' camelCase JSON.

use serde::Serialize;

use crate::error::MediaApiError;

// ---------------------------------------------------------------------------
// Frame extraction
// ---------------------------------------------------------------------------

/// Query parameters for `POST /extract-frames`.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractOptions {
    pub quality: String,
    pub width: u32,
    pub height: u32,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            quality: "high".to_string(),
            width: 1920,
            height: 1080,
        }
    }
}

/// An uploaded video handed to the extraction service.
#[derive(Debug, Clone)]
pub struct VideoUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

// ---------------------------------------------------------------------------
// AI interpolation
// ---------------------------------------------------------------------------

/// Body for `POST /generate-ai-video`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpolationRequest {
    /// Retrievable URL of the lower anchor frame.
    pub first_image: String,
    /// Retrievable URL of the upper anchor frame.
    pub last_image: String,
    pub prompt: String,
    /// Length of the generated clip, in seconds.
    pub duration: u32,
    pub fps: u32,
    /// Width of the frames extracted from the generated clip, in pixels.
    pub width: u32,
}

/// Default generated clip length in seconds.
pub const DEFAULT_INTERPOLATION_SECS: u32 = 6;
/// Default FPS used to cut the generated clip into frames.
pub const DEFAULT_INTERPOLATION_FPS: u32 = 24;
/// Default frame width for the generated clip.
pub const DEFAULT_INTERPOLATION_WIDTH: u32 = 1280;

impl InterpolationRequest {
    /// Build a request with the default duration, FPS and width.
    pub fn new(first_image: String, last_image: String, prompt: String) -> Self {
        Self {
            first_image,
            last_image,
            prompt,
            duration: DEFAULT_INTERPOLATION_SECS,
            fps: DEFAULT_INTERPOLATION_FPS,
            width: DEFAULT_INTERPOLATION_WIDTH,
        }
    }
}

/// Parsed `generate-ai-video` response.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolationResult {
    /// New in-between frames as data URIs, in temporal order.
    pub frames: Vec<String>,
    /// Rendered video of the updated storyboard; may be relative.
    pub video_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Frames to video
// ---------------------------------------------------------------------------

/// Body for `POST /frames-to-video`.
#[derive(Debug, Clone, Serialize)]
pub struct RenderRequest {
    pub frames: Vec<String>,
    pub fps: u32,
    pub quality: String,
    pub bitrate: String,
    pub preset: String,
    pub crf: u32,
}

impl RenderRequest {
    /// Final-export settings: 30 fps, high quality, 5000k, slow preset, CRF 18.
    pub fn final_export(frames: Vec<String>) -> Self {
        Self {
            frames,
            fps: 30,
            quality: "high".to_string(),
            bitrate: "5000k".to_string(),
            preset: "slow".to_string(),
            crf: 18,
        }
    }
}

/// Video bytes returned by a render or download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Fallback content type for videos the service does not label.
pub const DEFAULT_VIDEO_MIME: &str = "video/mp4";

// ---------------------------------------------------------------------------
// Payload parsing
// ---------------------------------------------------------------------------

/// Accept `{"frames": [...]}` or a bare `[...]`.
pub fn parse_extracted_frames(value: serde_json::Value) -> Result<Vec<String>, MediaApiError> {
    match value {
        serde_json::Value::Array(items) => string_array(items),
        serde_json::Value::Object(mut obj) => match obj.remove("frames") {
            Some(serde_json::Value::Array(items)) => string_array(items),
            _ => Err(MediaApiError::Contract(
                "expected a frames array in the extraction response".to_string(),
            )),
        },
        _ => Err(MediaApiError::Contract(
            "expected a frames array in the extraction response".to_string(),
        )),
    }
}

/// Require `frames` (array) and take an optional string `videoUrl`.
pub fn parse_interpolation(value: serde_json::Value) -> Result<InterpolationResult, MediaApiError> {
    let serde_json::Value::Object(mut obj) = value else {
        return Err(MediaApiError::Contract(
            "interpolation response is not a JSON object".to_string(),
        ));
    };

    let frames = match obj.remove("frames") {
        Some(serde_json::Value::Array(items)) => string_array(items)?,
        _ => {
            return Err(MediaApiError::Contract(
                "interpolation response has no frames array".to_string(),
            ))
        }
    };

    let video_url = match obj.remove("videoUrl") {
        Some(serde_json::Value::String(url)) if !url.is_empty() => Some(url),
        _ => None,
    };

    Ok(InterpolationResult { frames, video_url })
}

/// Pull `videoUrl` out of a JSON render response.
pub fn parse_video_url(value: &serde_json::Value) -> Result<String, MediaApiError> {
    value
        .get("videoUrl")
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| MediaApiError::Contract("render response has no videoUrl".to_string()))
}

fn string_array(items: Vec<serde_json::Value>) -> Result<Vec<String>, MediaApiError> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            serde_json::Value::String(s) => Ok(s),
            _ => Err(MediaApiError::Contract(format!(
                "frame {i} is not a string"
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extraction_accepts_wrapped_and_bare() {
        let wrapped = parse_extracted_frames(json!({"frames": ["a", "b"]})).unwrap();
        let bare = parse_extracted_frames(json!(["a", "b"])).unwrap();
        assert_eq!(wrapped, vec!["a", "b"]);
        assert_eq!(wrapped, bare);
    }

    #[test]
    fn extraction_rejects_other_shapes() {
        assert!(parse_extracted_frames(json!({"frames": "a"})).unwrap_err().is_contract_violation());
        assert!(parse_extracted_frames(json!({"images": []})).is_err());
        assert!(parse_extracted_frames(json!("a")).is_err());
        assert!(parse_extracted_frames(json!([1, 2])).is_err());
    }

    #[test]
    fn interpolation_video_url_is_optional() {
        let with = parse_interpolation(json!({"frames": ["x"], "videoUrl": "/v/1.mp4"})).unwrap();
        assert_eq!(with.video_url.as_deref(), Some("/v/1.mp4"));

        let without = parse_interpolation(json!({"frames": []})).unwrap();
        assert!(without.frames.is_empty());
        assert_eq!(without.video_url, None);
    }

    #[test]
    fn interpolation_requires_frames_array() {
        assert!(parse_interpolation(json!({"videoUrl": "/v.mp4"})).is_err());
        assert!(parse_interpolation(json!({"frames": {}})).is_err());
        assert!(parse_interpolation(json!([])).is_err());
    }

    #[test]
    fn video_url_must_be_present() {
        assert_eq!(parse_video_url(&json!({"videoUrl": "http://x/v.mp4"})).unwrap(), "http://x/v.mp4");
        assert!(parse_video_url(&json!({"videoUrl": ""})).is_err());
        assert!(parse_video_url(&json!({})).is_err());
    }

    #[test]
    fn interpolation_request_serializes_camel_case() {
        let req = InterpolationRequest::new("u1".into(), "u2".into(), "sunset".into());
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "firstImage": "u1",
                "lastImage": "u2",
                "prompt": "sunset",
                "duration": 6,
                "fps": 24,
                "width": 1280,
            })
        );
    }

    #[test]
    fn final_export_settings() {
        let value = serde_json::to_value(RenderRequest::final_export(vec!["f".into()])).unwrap();
        assert_eq!(
            value,
            json!({
                "frames": ["f"],
                "fps": 30,
                "quality": "high",
                "bitrate": "5000k",
                "preset": "slow",
                "crf": 18,
            })
        );
    }
}
