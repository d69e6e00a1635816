//! Project thumbnail rendering.
//!
//! Thumbnails are cut from a storyboard frame: decoded, resized to a fixed
//! 16:9 box and re-encoded as JPEG.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::CoreError;

/// Thumbnail width in pixels.
pub const THUMBNAIL_WIDTH: u32 = 400;

/// Thumbnail height in pixels.
pub const THUMBNAIL_HEIGHT: u32 = 225;

/// JPEG quality (0-100).
pub const THUMBNAIL_QUALITY: u8 = 80;

pub const THUMBNAIL_MIME: &str = "image/jpeg";

/// Decode a PNG/JPEG/WebP still and render a 400x225 JPEG thumbnail.
pub fn render_thumbnail(image_bytes: &[u8]) -> Result<Vec<u8>, CoreError> {
    let decoded = image::load_from_memory(image_bytes)
        .map_err(|e| CoreError::Validation(format!("cannot decode frame image: {e}")))?;

    let resized = decoded.resize_exact(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, FilterType::Triangle);
    encode_jpeg(&DynamicImage::ImageRgb8(resized.to_rgb8()), THUMBNAIL_QUALITY)
}

/// Re-encode any decodable still as JPEG at `quality`, keeping its size.
///
/// Anchor frames are uploaded as `.jpg` blobs regardless of how the
/// extraction service encoded them.
pub fn to_jpeg(image_bytes: &[u8], quality: u8) -> Result<Vec<u8>, CoreError> {
    let decoded = image::load_from_memory(image_bytes)
        .map_err(|e| CoreError::Validation(format!("cannot decode frame image: {e}")))?;
    encode_jpeg(&DynamicImage::ImageRgb8(decoded.to_rgb8()), quality)
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, CoreError> {
    let mut out = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    image
        .write_with_encoder(encoder)
        .map_err(|e| CoreError::Internal(format!("cannot encode JPEG: {e}")))?;
    Ok(out.into_inner())
}
