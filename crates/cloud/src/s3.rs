//! S3 blob backend.

use async_trait::async_trait;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;

use crate::config::S3Config;
use crate::error::StorageError;
use crate::{validate_key, BlobStore, StoredBlob};

/// Stores blobs as objects in one bucket.
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3BlobStore {
    /// Build a client from the default credential chain plus `config`.
    pub async fn new(config: S3Config) -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let mut builder = Builder::from(&sdk_config)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.endpoint.is_some());

        if let Some(ref endpoint) = config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        let public_base_url = public_base_url(&config);
        tracing::info!(bucket = %config.bucket, base = %public_base_url, "S3 blob store ready");

        Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            bucket: config.bucket,
            public_base_url,
        }
    }
}

/// Explicit public URL, else path-style on a custom endpoint, else the
/// virtual-hosted AWS URL.
fn public_base_url(config: &S3Config) -> String {
    let base = match (&config.public_base_url, &config.endpoint) {
        (Some(url), _) => url.clone(),
        (None, Some(endpoint)) => format!("{}/{}", endpoint.trim_end_matches('/'), config.bucket),
        (None, None) => format!("https://{}.s3.{}.amazonaws.com", config.bucket, config.region),
    };
    base.trim_end_matches('/').to_string()
}

fn map_sdk_error<E>(err: SdkError<E>) -> StorageError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let message = DisplayErrorContext(&err).to_string();
    match err.raw_response().map(|r| r.status().as_u16()) {
        Some(status) => StorageError::from_status(status, message),
        None => StorageError::new(crate::StorageErrorCode::Unknown, message),
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredBlob, StorageError> {
        validate_key(key)?;
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(map_sdk_error)?;

        tracing::debug!(bucket = %self.bucket, key, size, "Object uploaded");
        Ok(StoredBlob {
            key: key.to_string(),
            url: self.url_for(key),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(map_sdk_error)?;
        tracing::debug!(bucket = %self.bucket, key, "Object deleted");
        Ok(())
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base_url)
    }
}
