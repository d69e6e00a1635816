use storysplice_cloud::StorageError;
use storysplice_core::error::CoreError;
use storysplice_media::error::MediaApiError;

use crate::ports::StoreError;

/// Longest service body excerpt carried into a user-facing message.
const BODY_EXCERPT_CHARS: usize = 300;

/// Structured category of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rejected before any network call.
    Validation,
    /// Another operation is in flight for the session.
    Conflict,
    NotFound,
    /// Service unreachable or answered non-2xx.
    Transport,
    /// Service answered 2xx with an unexpected payload.
    Contract,
    /// Blob or record store refused or failed the write.
    Store,
    Internal,
}

/// The media step that failed, for messages and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaStep {
    Extraction,
    Interpolation,
    Rendering,
}

impl MediaStep {
    fn label(self) -> &'static str {
        match self {
            Self::Extraction => "Frame extraction",
            Self::Interpolation => "Video generation",
            Self::Rendering => "Final video rendering",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{step:?} failed: {source}")]
    Media {
        step: MediaStep,
        #[source]
        source: MediaApiError,
    },

    #[error("Blob storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Project store failed: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn media(step: MediaStep, source: MediaApiError) -> Self {
        Self::Media { step, source }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::Validation,
            Self::Conflict(_) => FailureKind::Conflict,
            Self::NotFound(_) => FailureKind::NotFound,
            Self::Media { source, .. } if source.is_contract_violation() => FailureKind::Contract,
            Self::Media { .. } => FailureKind::Transport,
            Self::Storage(_) | Self::Store(_) => FailureKind::Store,
            Self::Internal(_) => FailureKind::Internal,
        }
    }

    /// Human-readable message for the person at the editor.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::Conflict(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Media { step, source } => media_message(*step, source),
            Self::Storage(err) => err.code.user_message().to_string(),
            Self::Store(err) => err.user_message().to_string(),
            Self::Internal(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

fn media_message(step: MediaStep, err: &MediaApiError) -> String {
    if err.is_unreachable() {
        return "The media service is unavailable. Make sure it is running and try again."
            .to_string();
    }
    if err.is_ffmpeg_failure() {
        return "FFmpeg could not process the frames. Check that the image format is valid \
                and that the media server has enough memory and disk space."
            .to_string();
    }
    match err {
        MediaApiError::Api { status, body } => {
            format!("{} failed ({status}): {}", step.label(), excerpt(body))
        }
        MediaApiError::Contract(detail) => {
            format!("{} returned an unexpected response: {detail}", step.label())
        }
        MediaApiError::Request(_) => format!("{} failed. Please try again.", step.label()),
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(BODY_EXCERPT_CHARS).collect();
    format!("{cut}...")
}

impl From<CoreError> for PipelineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => Self::Validation(msg),
            CoreError::Conflict(msg) => Self::Conflict(msg),
            CoreError::NotFound { entity, id } => Self::NotFound(format!("{entity} {id} not found")),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storysplice_cloud::StorageErrorCode;

    #[test]
    fn contract_and_transport_are_distinct() {
        let contract = PipelineError::media(
            MediaStep::Interpolation,
            MediaApiError::Contract("no frames array".into()),
        );
        let transport = PipelineError::media(
            MediaStep::Interpolation,
            MediaApiError::Api {
                status: 503,
                body: "busy".into(),
            },
        );
        assert_eq!(contract.kind(), FailureKind::Contract);
        assert_eq!(transport.kind(), FailureKind::Transport);
        assert_eq!(transport.user_message(), "Video generation failed (503): busy");
    }

    #[test]
    fn ffmpeg_failures_get_dedicated_message() {
        let err = PipelineError::media(
            MediaStep::Rendering,
            MediaApiError::Api {
                status: 500,
                body: r#"{"error":"ffmpeg exited with code 1"}"#.into(),
            },
        );
        assert!(err.user_message().starts_with("FFmpeg could not process"));
    }

    #[test]
    fn long_bodies_are_cut() {
        let err = PipelineError::media(
            MediaStep::Extraction,
            MediaApiError::Api {
                status: 500,
                body: "x".repeat(1000),
            },
        );
        let msg = err.user_message();
        assert!(msg.ends_with("..."));
        assert!(msg.len() < 400);
    }

    #[test]
    fn storage_errors_use_code_messages() {
        let err = PipelineError::from(StorageError::new(StorageErrorCode::Unauthorized, "403"));
        assert_eq!(err.kind(), FailureKind::Store);
        assert_eq!(err.user_message(), StorageErrorCode::Unauthorized.user_message());
    }

    #[test]
    fn core_errors_keep_their_category() {
        let err = PipelineError::from(CoreError::Validation("bad".into()));
        assert_eq!(err.kind(), FailureKind::Validation);
        assert_eq!(err.user_message(), "bad");
    }
}
