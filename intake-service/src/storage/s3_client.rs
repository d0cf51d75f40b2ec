//! S3-compatible object storage client (MinIO in the default deployment)

use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use super::{read_declared_length, ObjectStore, StorageError, UploadBody};

/// S3 configuration
#[derive(Debug, Clone)]
pub struct S3Config {
    /// `host:port`, or a full URL with scheme
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub use_ssl: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            endpoint: "storage:9000".to_string(),
            region: "us-east-1".to_string(),
            access_key_id: "admin".to_string(),
            secret_access_key: "password".to_string(),
            use_ssl: false,
        }
    }
}

impl S3Config {
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else if self.use_ssl {
            format!("https://{}", self.endpoint)
        } else {
            format!("http://{}", self.endpoint)
        }
    }
}

/// S3 client for object storage operations
pub struct S3Client {
    client: Client,
}

impl S3Client {
    /// Create a new S3 client. No request is made until first use.
    pub async fn new(config: S3Config) -> Self {
        let endpoint_url = config.endpoint_url();
        info!("Initializing S3 client for endpoint: {}", endpoint_url);

        let credentials = Credentials::new(
            config.access_key_id,
            config.secret_access_key,
            None,
            None,
            "intake-service",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .endpoint_url(endpoint_url)
            .load()
            .await;

        // MinIO serves buckets by path, not by virtual host
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(s3_config),
        }
    }
}

fn is_not_found<E>(err: &SdkError<E>) -> bool {
    err.raw_response()
        .map(|response| response.status().as_u16() == 404)
        .unwrap_or(false)
}

#[async_trait::async_trait]
impl ObjectStore for S3Client {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let missing = err
                    .as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false);

                if missing || is_not_found(&err) {
                    Ok(false)
                } else {
                    Err(StorageError::Bucket(DisplayErrorContext(&err).to_string()))
                }
            }
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        match self.client.create_bucket().bucket(bucket).send().await {
            Ok(_) => {
                info!("Bucket created: {}", bucket);
                Ok(())
            }
            Err(err) => match err.as_service_error() {
                Some(e) if e.is_bucket_already_owned_by_you() || e.is_bucket_already_exists() => {
                    debug!("Bucket {} was created concurrently", bucket);
                    Ok(())
                }
                _ => Err(StorageError::Bucket(DisplayErrorContext(&err).to_string())),
            },
        }
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        mut body: UploadBody,
        length: u64,
    ) -> Result<(), StorageError> {
        let data = read_declared_length(&mut body, length).await?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .content_length(length as i64)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StorageError::Upload(DisplayErrorContext(&e).to_string()))?;

        debug!("Uploaded {}/{} ({} bytes)", bucket, key, length);
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let output = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(output) => output,
            Err(err) => {
                let missing = err
                    .as_service_error()
                    .map(|e| e.is_no_such_key())
                    .unwrap_or(false);

                if missing || is_not_found(&err) {
                    return Ok(None);
                }
                return Err(StorageError::Download(DisplayErrorContext(&err).to_string()));
            }
        };

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Download(format!("Failed to read object body: {}", e)))?
            .into_bytes();

        Ok(Some(data.to_vec()))
    }
}
