/// Errors from the media service clients.
#[derive(Debug, thiserror::Error)]
pub enum MediaApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Media API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The service answered 2xx but the payload is not what we expect.
    #[error("Unexpected response from media API: {0}")]
    Contract(String),
}

impl MediaApiError {
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::Contract(_))
    }

    /// Whether the service reported an ffmpeg failure while assembling frames.
    pub fn is_ffmpeg_failure(&self) -> bool {
        match self {
            Self::Api { body, .. } => body.to_ascii_lowercase().contains("ffmpeg"),
            _ => false,
        }
    }

    /// Whether the service could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Request(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }

    /// HTTP status, when the service answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::Contract(_) => None,
        }
    }
}
