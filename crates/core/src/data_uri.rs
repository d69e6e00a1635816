//! `data:` URI encoding and decoding for storyboard frames.
//!
//! Frames travel between the media services as `data:<mime>;base64,<payload>`
//! strings. Blob uploads need the raw bytes, and served frames need the
//! mime type, so both directions live here.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::CoreError;

/// Mime type assumed when a frame carries none.
pub const DEFAULT_FRAME_MIME: &str = "image/jpeg";

/// A decoded `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    /// Parse `data:<mime>;base64,<payload>`.
    ///
    /// A bare base64 payload (no `data:` prefix) is accepted and treated as
    /// [`DEFAULT_FRAME_MIME`]. Only base64-encoded URIs are supported.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let input = input.trim();

        let Some(rest) = input.strip_prefix("data:") else {
            return Ok(Self {
                mime: DEFAULT_FRAME_MIME.to_string(),
                bytes: decode_payload(input)?,
            });
        };

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| CoreError::Validation("data URI is missing ','".to_string()))?;

        let mut parts = header.split(';');
        let mime = parts.next().unwrap_or_default().trim();
        if !parts.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(CoreError::Validation(
                "only base64 data URIs are supported".to_string(),
            ));
        }

        let mime = if mime.is_empty() {
            DEFAULT_FRAME_MIME
        } else {
            mime
        };

        Ok(Self {
            mime: mime.to_string(),
            bytes: decode_payload(payload)?,
        })
    }

    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    /// Render back to `data:<mime>;base64,<payload>`.
    pub fn encode(&self) -> String {
        encode(&self.mime, &self.bytes)
    }
}

/// Encode raw bytes as a `data:` URI.
pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

fn decode_payload(payload: &str) -> Result<Vec<u8>, CoreError> {
    if payload.is_empty() {
        return Err(CoreError::Validation("data URI payload is empty".to_string()));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| CoreError::Validation(format!("invalid base64 payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_png_uri() {
        let uri = DataUri::parse("data:image/png;base64,AQID").unwrap();
        assert_eq!(uri.mime, "image/png");
        assert_eq!(uri.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn missing_mime_defaults_to_jpeg() {
        let uri = DataUri::parse("data:;base64,AQID").unwrap();
        assert_eq!(uri.mime, DEFAULT_FRAME_MIME);
    }

    #[test]
    fn bare_payload_is_jpeg() {
        let uri = DataUri::parse("AQID").unwrap();
        assert_eq!(uri.mime, DEFAULT_FRAME_MIME);
        assert_eq!(uri.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn extra_parameters_are_tolerated() {
        let uri = DataUri::parse("data:image/jpeg;name=a.jpg;base64,AQID").unwrap();
        assert_eq!(uri.mime, "image/jpeg");
    }

    #[test]
    fn rejects_non_base64_uri() {
        assert_matches!(
            DataUri::parse("data:text/plain,hello"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn rejects_missing_comma() {
        assert_matches!(
            DataUri::parse("data:image/png;base64"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn rejects_garbage_payload() {
        assert!(DataUri::parse("data:image/png;base64,@@@").is_err());
        assert!(DataUri::parse("data:image/png;base64,").is_err());
    }

    #[test]
    fn encode_produces_parseable_uri() {
        let s = encode("image/webp", &[9, 8, 7, 6]);
        assert!(s.starts_with("data:image/webp;base64,"));
        assert_eq!(DataUri::parse(&s).unwrap(), DataUri::new("image/webp", vec![9, 8, 7, 6]));
    }
}
