use std::io::Cursor;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    Json,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::errors::{ApiError, ApiResult};
use crate::models::{UploadRequest, UploadResponse};
use crate::AppState;

/// Multipart field carrying the file
const FILE_FIELD: &str = "file";

/// Handle a file upload
///
/// POST /upload/file/:file_name
pub async fn upload_file(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let mut multipart = multipart?;
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("upload", %request_id, file_name = %file_name);

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            tracing::debug!(parent: &span, "Skipping field: {:?}", field.name());
            continue;
        }

        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());
        let data = field.bytes().await?;
        upload = Some((content_type, data));
        break;
    }

    let (content_type, data) =
        upload.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;

    tracing::info!(
        parent: &span,
        "File received: size={} bytes, content_type={}",
        data.len(),
        content_type
    );

    let request = UploadRequest {
        file_name,
        content_type,
        body: Box::new(Cursor::new(data)),
    };

    // Run detached so a client disconnect does not abort a write or publish
    // that is already under way.
    let pipeline = state.pipeline.clone();
    let response = tokio::spawn(async move { pipeline.handle(request).await }.instrument(span))
        .await
        .map_err(|e| ApiError::Internal(format!("Upload task failed: {}", e)))??;

    Ok(Json(response))
}
