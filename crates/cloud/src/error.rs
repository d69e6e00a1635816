use std::fmt;

/// Stable failure categories reported by blob backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    Unauthorized,
    Canceled,
    NotFound,
    InvalidKey,
    Unknown,
}

impl StorageErrorCode {
    /// Machine-readable code, in the `storage/*` namespace.
    pub fn code(self) -> &'static str {
        match self {
            Self::Unauthorized => "storage/unauthorized",
            Self::Canceled => "storage/canceled",
            Self::NotFound => "storage/object-not-found",
            Self::InvalidKey => "storage/invalid-key",
            Self::Unknown => "storage/unknown",
        }
    }

    pub fn user_message(self) -> &'static str {
        match self {
            Self::Unauthorized => "Permission denied. Please make sure you are signed in.",
            Self::Canceled => "Upload was canceled.",
            Self::NotFound => "The requested file does not exist.",
            Self::InvalidKey => "Invalid file location.",
            Self::Unknown => "An unknown storage error occurred. Please try again.",
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A blob backend failure with its category and backend detail.
#[derive(Debug, thiserror::Error)]
#[error("{code}: {message}")]
pub struct StorageError {
    pub code: StorageErrorCode,
    pub message: String,
}

impl StorageError {
    pub fn new(code: StorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Map an HTTP status from an object-store response.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let code = match status {
            401 | 403 => StorageErrorCode::Unauthorized,
            404 => StorageErrorCode::NotFound,
            499 => StorageErrorCode::Canceled,
            _ => StorageErrorCode::Unknown,
        };
        Self::new(code, message)
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorCode::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorCode::Unauthorized,
            std::io::ErrorKind::Interrupted => StorageErrorCode::Canceled,
            _ => StorageErrorCode::Unknown,
        };
        Self::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_codes() {
        let nf = StorageError::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(nf.code, StorageErrorCode::NotFound);
        let denied = StorageError::from(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert_eq!(denied.code, StorageErrorCode::Unauthorized);
    }

    #[test]
    fn statuses_map_to_codes() {
        assert_eq!(StorageError::from_status(403, "").code, StorageErrorCode::Unauthorized);
        assert_eq!(StorageError::from_status(404, "").code, StorageErrorCode::NotFound);
        assert_eq!(StorageError::from_status(500, "").code, StorageErrorCode::Unknown);
    }

    #[test]
    fn display_includes_code() {
        let err = StorageError::new(StorageErrorCode::NotFound, "videos/1/a.mp4");
        assert_eq!(err.to_string(), "storage/object-not-found: videos/1/a.mp4");
    }
}
