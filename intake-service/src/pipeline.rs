//! Upload intake pipeline: classify, store, announce.
//!
//! Storage always happens before publication, so every announced file can be
//! fetched. The converse does not hold: when publication fails the object
//! stays in storage unannounced and the request fails. Nothing is rolled back
//! or retried here.

use std::io::SeekFrom;

use shared::messaging::{EventPublisher, FileUploadedEvent, MessageError};
use thiserror::Error;
use tokio::io::AsyncSeekExt;
use tracing::{debug, error, info, warn};

use crate::classifier::{classify, RoutingRejected};
use crate::models::{UploadRequest, UploadResponse};
use crate::storage::{ObjectStoreGateway, StorageError, UploadBody};

#[derive(Debug, Error)]
pub enum IntakeError {
    /// No routing rule matched; nothing was stored or published
    #[error(transparent)]
    Rejected(#[from] RoutingRejected),

    /// The upload body could not be measured; nothing was stored
    #[error("File processing error: {0}")]
    StreamMeasurement(#[source] std::io::Error),

    /// The object was not written
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The object at `file_path` is stored but was never announced
    #[error("Kafka error: {source}")]
    Publish {
        file_path: String,
        #[source]
        source: MessageError,
    },
}

pub struct IntakePipeline {
    storage: ObjectStoreGateway,
    publisher: EventPublisher,
}

impl IntakePipeline {
    pub fn new(storage: ObjectStoreGateway, publisher: EventPublisher) -> Self {
        Self { storage, publisher }
    }

    pub async fn handle(&self, request: UploadRequest) -> Result<UploadResponse, IntakeError> {
        let UploadRequest {
            file_name,
            content_type,
            mut body,
        } = request;

        let routing = classify(&file_name).map_err(|e| {
            warn!("Rejected upload {}: no routing rule matched", file_name);
            e
        })?;
        debug!(folder = routing.folder, topic = routing.topic, "Upload classified");

        let length = measure_length(&mut body)
            .await
            .map_err(IntakeError::StreamMeasurement)?;

        let reference = self
            .storage
            .store(routing.folder, &file_name, &content_type, body, length)
            .await
            .map_err(|e| {
                error!("Failed to store {}: {}", file_name, e);
                e
            })?;

        let event = FileUploadedEvent::new(file_name, reference.file_path());
        if let Err(source) = self.publisher.publish(routing.topic, &event).await {
            error!(
                file_path = %event.file_path,
                "Object stored but not announced: {}",
                source
            );
            return Err(IntakeError::Publish {
                file_path: event.file_path,
                source,
            });
        }

        info!(
            file_path = %event.file_path,
            topic = routing.topic,
            bytes = length,
            "Upload stored and announced"
        );
        Ok(UploadResponse::sent(event.file_path))
    }
}

/// Measure the body by seeking to its end, then rewind to the start
async fn measure_length(body: &mut UploadBody) -> std::io::Result<u64> {
    let length = body.seek(SeekFrom::End(0)).await?;
    body.seek(SeekFrom::Start(0)).await?;
    Ok(length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BucketConfig, StoredObjectReference};
    use crate::test_utils::{body_from, upload_request, InMemoryStore, MockQueue, UnseekableStream};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn pipeline(store: Arc<InMemoryStore>, queue: MockQueue) -> IntakePipeline {
        IntakePipeline::new(
            ObjectStoreGateway::new(store, BucketConfig::default()),
            EventPublisher::new(Arc::new(queue)),
        )
    }

    #[tokio::test]
    async fn test_session_upload_is_stored_and_announced() {
        let store = Arc::new(InMemoryStore::default());
        let mut queue = MockQueue::new();
        queue
            .expect_publish()
            .withf(|topic, payload| {
                topic == "session_topic"
                    && payload
                        == br#"{"file_name":"session_log.txt","file_path":"uploads/sessions/session_log.txt"}"#
                            .as_slice()
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let response = pipeline(store.clone(), queue)
            .handle(upload_request("session_log.txt", "text/plain", b"0123456789"))
            .await
            .unwrap();

        assert_eq!(response, UploadResponse::sent("uploads/sessions/session_log.txt"));

        let object = store.object("uploads", "sessions/session_log.txt").unwrap();
        assert_eq!(object.data.len(), 10);
        assert_eq!(object.content_type, "text/plain");
    }

    #[tokio::test]
    async fn test_employee_file_path() {
        let store = Arc::new(InMemoryStore::default());
        let mut queue = MockQueue::new();
        queue
            .expect_publish()
            .withf(|topic, _| topic == "employee_topic")
            .times(1)
            .returning(|_, _| Ok(()));

        let response = pipeline(store.clone(), queue)
            .handle(upload_request("employee_42.csv", "text/csv", b"id,name\n42,x\n"))
            .await
            .unwrap();

        assert_eq!(response.file_path, "uploads/employee_files/employee_42.csv");
        assert!(store.object("uploads", "employee_files/employee_42.csv").is_some());
    }

    #[tokio::test]
    async fn test_rejected_name_has_no_side_effects() {
        let store = Arc::new(InMemoryStore::default());
        let mut queue = MockQueue::new();
        queue.expect_publish().never();

        let result = pipeline(store.clone(), queue)
            .handle(upload_request("report.pdf", "application/pdf", b"%PDF"))
            .await;

        assert!(matches!(result, Err(IntakeError::Rejected(_))));
        assert_eq!(store.bucket_checks.load(Ordering::SeqCst), 0);
        assert_eq!(store.put_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unmeasurable_stream_is_not_stored() {
        let store = Arc::new(InMemoryStore::default());
        let mut queue = MockQueue::new();
        queue.expect_publish().never();

        let request = UploadRequest {
            file_name: "client_a.csv".to_string(),
            content_type: "text/csv".to_string(),
            body: Box::new(UnseekableStream),
        };
        let err = pipeline(store.clone(), queue).handle(request).await.unwrap_err();

        assert!(matches!(err, IntakeError::StreamMeasurement(_)));
        assert!(err.to_string().starts_with("File processing error:"));
        assert_eq!(store.put_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_skips_publish() {
        let store = Arc::new(InMemoryStore::failing_puts());
        let mut queue = MockQueue::new();
        queue.expect_publish().times(0);

        let result = pipeline(store.clone(), queue)
            .handle(upload_request("client_a.csv", "text/csv", b"a,b"))
            .await;

        assert!(matches!(result, Err(IntakeError::Storage(StorageError::Upload(_)))));
    }

    #[tokio::test]
    async fn test_publish_failure_leaves_object_stored() {
        let store = Arc::new(InMemoryStore::default());
        let mut queue = MockQueue::new();
        queue
            .expect_publish()
            .times(1)
            .returning(|_, _| Err(MessageError::Delivery("Message timed out".to_string())));

        let pipeline = pipeline(store.clone(), queue);
        let err = pipeline
            .handle(upload_request("client_a.csv", "text/csv", b"a,b"))
            .await
            .unwrap_err();

        match &err {
            IntakeError::Publish { file_path, .. } => {
                assert_eq!(file_path, "uploads/client_files/client_a.csv")
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().starts_with("Kafka error:"));

        let reference = StoredObjectReference::new("uploads", "client_files", "client_a.csv");
        assert_eq!(
            pipeline.storage.fetch(&reference).await.unwrap(),
            Some(b"a,b".to_vec())
        );
    }

    #[tokio::test]
    async fn test_stream_is_rewound_before_store() {
        let store = Arc::new(InMemoryStore::default());
        let mut queue = MockQueue::new();
        queue.expect_publish().returning(|_, _| Ok(()));

        let mut body = body_from(b"sessions payload");
        body.seek(SeekFrom::Start(5)).await.unwrap();

        let request = UploadRequest {
            file_name: "sessions.bin".to_string(),
            content_type: "application/octet-stream".to_string(),
            body,
        };
        pipeline(store.clone(), queue).handle(request).await.unwrap();

        let object = store.object("uploads", "sessions/sessions.bin").unwrap();
        assert_eq!(object.data, b"sessions payload");
    }
}
