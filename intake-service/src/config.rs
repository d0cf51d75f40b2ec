//! Configuration for the intake service
//!
//! Every setting comes from an environment variable (optionally via a `.env`
//! file) and has a default suitable for the docker-compose deployment.

use anyhow::{bail, Context, Result};
use shared::messaging::KafkaConfig;
use shared::observability::{LogConfig, LogFormat, LogLevel};

use crate::storage::s3_client::S3Config;
use crate::storage::BucketConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub kafka: KafkaSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_size_mb: usize,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub secure: bool,
    pub uploads_bucket: String,
    pub warehouse_bucket: String,
}

#[derive(Debug, Clone)]
pub struct KafkaSettings {
    pub bootstrap_servers: String,
    pub client_id: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            server: ServerConfig {
                host: var("SERVER_HOST", "0.0.0.0"),
                port: var("SERVER_PORT", "8000")
                    .parse()
                    .context("Invalid SERVER_PORT")?,
                max_upload_size_mb: var("MAX_UPLOAD_SIZE_MB", "100")
                    .parse()
                    .context("Invalid MAX_UPLOAD_SIZE_MB")?,
            },
            storage: StorageConfig {
                endpoint: var("MINIO_ENDPOINT", "storage:9000"),
                access_key: var("MINIO_ACCESS_KEY", "admin"),
                secret_key: var("MINIO_SECRET_KEY", "password"),
                region: var("MINIO_REGION", "us-east-1"),
                secure: var("MINIO_SECURE", "false")
                    .parse()
                    .context("Invalid MINIO_SECURE")?,
                uploads_bucket: var("UPLOADS_BUCKET_NAME", "uploads"),
                warehouse_bucket: var("WAREHOUSE_BUCKET_NAME", "warehouse"),
            },
            kafka: KafkaSettings {
                bootstrap_servers: var("KAFKA_BOOTSTRAP_SERVERS", "kafka:9092"),
                client_id: var("KAFKA_CLIENT_ID", "intake-service"),
            },
            logging: LoggingConfig {
                level: var("LOG_LEVEL", "info")
                    .parse()
                    .context("Invalid LOG_LEVEL")?,
                format: var("LOG_FORMAT", "pretty")
                    .parse()
                    .context("Invalid LOG_FORMAT")?,
            },
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("SERVER_PORT must be non-zero");
        }
        if self.server.max_upload_size_mb == 0 {
            bail!("MAX_UPLOAD_SIZE_MB must be non-zero");
        }
        if self.storage.uploads_bucket.is_empty() || self.storage.warehouse_bucket.is_empty() {
            bail!("Bucket names must not be empty");
        }
        if self.storage.uploads_bucket == self.storage.warehouse_bucket {
            bail!(
                "UPLOADS_BUCKET_NAME and WAREHOUSE_BUCKET_NAME must differ (both are {})",
                self.storage.uploads_bucket
            );
        }
        if self.kafka.bootstrap_servers.trim().is_empty() {
            bail!("KAFKA_BOOTSTRAP_SERVERS must not be empty");
        }
        Ok(())
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_size_mb * 1024 * 1024
    }
}

impl StorageConfig {
    pub fn s3_config(&self) -> S3Config {
        S3Config {
            endpoint: self.endpoint.clone(),
            region: self.region.clone(),
            access_key_id: self.access_key.clone(),
            secret_access_key: self.secret_key.clone(),
            use_ssl: self.secure,
        }
    }

    pub fn buckets(&self) -> BucketConfig {
        BucketConfig {
            uploads: self.uploads_bucket.clone(),
            warehouse: self.warehouse_bucket.clone(),
        }
    }
}

impl KafkaSettings {
    pub fn kafka_config(&self) -> KafkaConfig {
        KafkaConfig::from_bootstrap_servers(&self.bootstrap_servers, self.client_id.clone())
    }
}

impl LoggingConfig {
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.level,
            format: self.format,
            service_name: "intake-service".to_string(),
            ..Default::default()
        }
    }
}
