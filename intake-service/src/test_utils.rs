//! Test doubles for the storage and message bus capabilities

use std::collections::{HashMap, HashSet};
use std::io::{Cursor, SeekFrom};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use mockall::mock;
use shared::messaging::{EventPublisher, MessageError, MessageQueue};
use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};

use crate::models::UploadRequest;
use crate::pipeline::IntakePipeline;
use crate::storage::{
    read_declared_length, BucketConfig, ObjectStore, ObjectStoreGateway, StorageError, UploadBody,
};
use crate::AppState;

mock! {
    pub Queue {}

    #[async_trait]
    impl MessageQueue for Queue {
        async fn publish(&self, topic: &str, message: &[u8]) -> Result<(), MessageError>;
        async fn health_check(&self) -> bool;
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// In-memory object store with call counters
#[derive(Default)]
pub struct InMemoryStore {
    buckets: Mutex<HashSet<String>>,
    objects: Mutex<HashMap<(String, String), StoredObject>>,
    fail_puts: bool,
    fail_bucket_checks: bool,
    pub bucket_checks: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub put_calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn with_buckets(buckets: &[&str]) -> Self {
        let store = Self::default();
        store
            .buckets
            .lock()
            .unwrap()
            .extend(buckets.iter().map(|b| b.to_string()));
        store
    }

    pub fn failing_puts() -> Self {
        Self {
            fail_puts: true,
            ..Default::default()
        }
    }

    pub fn failing_bucket_checks() -> Self {
        Self {
            fail_bucket_checks: true,
            ..Default::default()
        }
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.buckets.lock().unwrap().contains(bucket)
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        self.bucket_checks.fetch_add(1, Ordering::SeqCst);
        if self.fail_bucket_checks {
            return Err(StorageError::Bucket("connection refused".to_string()));
        }
        Ok(self.has_bucket(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.buckets.lock().unwrap().insert(bucket.to_string());
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        mut body: UploadBody,
        length: u64,
    ) -> Result<(), StorageError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts {
            return Err(StorageError::Upload("quota exceeded".to_string()));
        }
        if !self.has_bucket(bucket) {
            return Err(StorageError::Upload(format!("no such bucket: {}", bucket)));
        }

        let data = read_declared_length(&mut body, length).await?;
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.object(bucket, key).map(|o| o.data))
    }
}

/// A body whose length cannot be measured
pub struct UnseekableStream;

impl AsyncRead for UnseekableStream {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl AsyncSeek for UnseekableStream {
    fn start_seek(self: Pin<&mut Self>, _position: SeekFrom) -> std::io::Result<()> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "stream is not seekable",
        ))
    }

    fn poll_complete(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<u64>> {
        Poll::Ready(Ok(0))
    }
}

pub fn body_from(data: &[u8]) -> UploadBody {
    Box::new(Cursor::new(data.to_vec()))
}

pub fn upload_request(file_name: &str, content_type: &str, data: &[u8]) -> UploadRequest {
    UploadRequest {
        file_name: file_name.to_string(),
        content_type: content_type.to_string(),
        body: body_from(data),
    }
}

pub fn app_state(store: Arc<InMemoryStore>, queue: MockQueue) -> AppState {
    let storage = ObjectStoreGateway::new(store, BucketConfig::default());
    let publisher = EventPublisher::new(Arc::new(queue));
    AppState {
        pipeline: Arc::new(IntakePipeline::new(storage.clone(), publisher.clone())),
        storage,
        publisher,
    }
}
