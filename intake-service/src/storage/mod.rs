//! Object storage gateway.
//!
//! [`ObjectStore`] is the raw storage capability (S3/MinIO in production, an
//! in-memory fake in tests). [`ObjectStoreGateway`] layers the intake rules on
//! top: both buckets are ensured before every write, and objects land in the
//! uploads bucket under `<folder>/<file_name>`.

pub mod s3_client;

use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek};
use tracing::{debug, info};

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Bucket creation error: {0}")]
    Bucket(String),

    #[error("Object storage upload error: {0}")]
    Upload(String),

    #[error("Object storage download error: {0}")]
    Download(String),
}

/// A readable, seekable upload body
pub trait UploadStream: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T: AsyncRead + AsyncSeek + Send + Unpin> UploadStream for T {}

pub type UploadBody = Box<dyn UploadStream>;

/// Object storage capability
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError>;

    /// Create a bucket. A bucket that already exists is not an error.
    async fn create_bucket(&self, bucket: &str) -> Result<(), StorageError>;

    /// Write exactly `length` bytes read from the body's current position
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: UploadBody,
        length: u64,
    ) -> Result<(), StorageError>;

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
}

/// Read exactly `length` bytes from the body or fail
pub async fn read_declared_length(
    body: &mut UploadBody,
    length: u64,
) -> Result<Vec<u8>, StorageError> {
    let mut data = Vec::with_capacity(length as usize);
    body.take(length)
        .read_to_end(&mut data)
        .await
        .map_err(|e| StorageError::Upload(format!("Failed to read upload stream: {}", e)))?;

    if (data.len() as u64) < length {
        return Err(StorageError::Upload(format!(
            "Upload stream ended after {} of {} bytes",
            data.len(),
            length
        )));
    }

    Ok(data)
}

/// Bucket names used by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketConfig {
    /// Write target for every upload
    pub uploads: String,
    /// Created alongside uploads, reserved for downstream consumers
    pub warehouse: String,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            uploads: "uploads".to_string(),
            warehouse: "warehouse".to_string(),
        }
    }
}

/// Pointer to a stored upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObjectReference {
    pub bucket: String,
    pub key: String,
}

impl StoredObjectReference {
    /// The key is `<folder>/<file_name>`. The file name is not sanitized, so a
    /// name containing `/` places the object deeper in the bucket.
    pub fn new(bucket: &str, folder: &str, file_name: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: format!("{}/{}", folder, file_name),
        }
    }

    /// `<bucket>/<key>`, the path announced downstream
    pub fn file_path(&self) -> String {
        format!("{}/{}", self.bucket, self.key)
    }
}

#[derive(Clone)]
pub struct ObjectStoreGateway {
    store: Arc<dyn ObjectStore>,
    buckets: BucketConfig,
}

impl ObjectStoreGateway {
    pub fn new(store: Arc<dyn ObjectStore>, buckets: BucketConfig) -> Self {
        Self { store, buckets }
    }

    /// Create the uploads and warehouse buckets if they are missing.
    /// Safe to call concurrently.
    pub async fn ensure_buckets(&self) -> Result<(), StorageError> {
        for bucket in [&self.buckets.uploads, &self.buckets.warehouse] {
            if !self.store.bucket_exists(bucket).await? {
                info!("Creating missing bucket: {}", bucket);
                self.store.create_bucket(bucket).await?;
            }
        }
        Ok(())
    }

    /// Store an upload under `<folder>/<file_name>` in the uploads bucket.
    ///
    /// The body must already be positioned at its start. Nothing is cleaned up
    /// if the write fails part-way.
    pub async fn store(
        &self,
        folder: &str,
        file_name: &str,
        content_type: &str,
        body: UploadBody,
        length: u64,
    ) -> Result<StoredObjectReference, StorageError> {
        self.ensure_buckets().await?;

        let reference = StoredObjectReference::new(&self.buckets.uploads, folder, file_name);
        debug!(
            "Writing object {} ({} bytes, {})",
            reference.file_path(),
            length,
            content_type
        );

        self.store
            .put_object(&reference.bucket, &reference.key, content_type, body, length)
            .await?;

        info!("Object stored: {}", reference.file_path());
        Ok(reference)
    }

    /// Read a stored object back, `None` if it does not exist
    #[cfg(test)]
    pub async fn fetch(
        &self,
        reference: &StoredObjectReference,
    ) -> Result<Option<Vec<u8>>, StorageError> {
        self.store.get_object(&reference.bucket, &reference.key).await
    }

    pub async fn health_check(&self) -> bool {
        self.store.bucket_exists(&self.buckets.uploads).await.is_ok()
    }
}
