//! Blob storage for finished videos, thumbnails and anchor frames.
//!
//! [`BlobStore`] is the seam; [`local::LocalBlobStore`] writes under a
//! directory served by the API, [`s3::S3BlobStore`] targets S3 or any
//! S3-compatible endpoint.

pub mod config;
pub mod error;
pub mod local;
pub mod s3;

use std::sync::Arc;

use async_trait::async_trait;

pub use config::StorageConfig;
pub use error::{StorageError, StorageErrorCode};

/// A blob that has been written and can be fetched at `url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub key: String,
    pub url: String,
}

/// Durable blob storage keyed by slash-separated paths.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `bytes` under `key`, replacing any existing blob.
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredBlob, StorageError>;

    /// Remove the blob at `key`. Missing blobs are `NotFound`.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Public URL for `key`. Does not check that the blob exists.
    fn url_for(&self, key: &str) -> String;
}

/// Reject keys that could escape the store root or are not relative paths.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|seg| seg.is_empty() || seg == "..");
    if invalid {
        return Err(StorageError::new(
            StorageErrorCode::InvalidKey,
            format!("invalid blob key '{key}'"),
        ));
    }
    Ok(())
}

/// Construct the backend selected by `config`.
pub async fn build_blob_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>, StorageError> {
    match config {
        StorageConfig::Local {
            root,
            public_base_url,
        } => {
            let store = local::LocalBlobStore::new(root.clone(), public_base_url.clone()).await?;
            Ok(Arc::new(store))
        }
        StorageConfig::S3(s3_config) => {
            let store = s3::S3BlobStore::new(s3_config.clone()).await;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_keys_are_accepted() {
        assert!(validate_key("videos/7/1700000000000_cut.mp4").is_ok());
        assert!(validate_key("thumb.jpg").is_ok());
    }

    #[test]
    fn escaping_keys_are_rejected() {
        for key in ["", "/etc/passwd", "videos/../secret", "..", "a//b", "a\\b", "a/"] {
            let err = validate_key(key).unwrap_err();
            assert_eq!(err.code, StorageErrorCode::InvalidKey, "key {key:?}");
        }
    }
}
