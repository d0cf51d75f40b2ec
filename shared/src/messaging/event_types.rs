use serde::{Deserialize, Serialize};

/// Announcement that an uploaded file has been durably stored.
///
/// Serialized field order is `file_name`, then `file_path`. No id, timestamp
/// or schema version is attached; consumers that need ordering or dedup must
/// derive it themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUploadedEvent {
    /// Name the file was uploaded under
    pub file_name: String,
    /// `<bucket>/<object key>` of the stored object
    pub file_path: String,
}

impl FileUploadedEvent {
    pub fn new(file_name: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            file_path: file_path.into(),
        }
    }
}
