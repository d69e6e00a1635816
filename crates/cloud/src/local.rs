//! Filesystem blob backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::StorageError;
use crate::{validate_key, BlobStore, StoredBlob};

/// Stores blobs as files under `root`; URLs are `{public_base_url}/{key}`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    /// Create the store, making sure `root` exists.
    pub async fn new(root: PathBuf, public_base_url: String) -> Result<Self, StorageError> {
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredBlob, StorageError> {
        validate_key(key)?;
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let size = bytes.len();
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(key, size, content_type, "Blob written");
        Ok(StoredBlob {
            key: key.to_string(),
            url: self.url_for(key),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        tokio::fs::remove_file(self.path_for(key)).await?;
        tracing::debug!(key, "Blob deleted");
        Ok(())
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base_url)
    }
}
