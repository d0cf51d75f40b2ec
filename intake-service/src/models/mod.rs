use serde::{Deserialize, Serialize};

use crate::storage::UploadBody;

/// Status reported once an upload is stored and announced
pub const UPLOAD_STATUS_SENT: &str = "sent to Kafka";

/// A single incoming upload. Lives only for the duration of one request.
pub struct UploadRequest {
    /// Declared file name, taken from the request path
    pub file_name: String,
    pub content_type: String,
    pub body: UploadBody,
}

impl std::fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRequest")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Successful upload response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    pub file_path: String,
}

impl UploadResponse {
    pub fn sent(file_path: impl Into<String>) -> Self {
        Self {
            status: UPLOAD_STATUS_SENT.to_string(),
            file_path: file_path.into(),
        }
    }
}

/// Error body returned for every failed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
