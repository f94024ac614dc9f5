//! Request handlers, grouped by resource.

pub mod items;
pub mod photos;
pub mod search;

use crate::error::{ApiError, ApiResult};
use axum::extract::multipart::Field;
use inv_attachments::StagedUpload;

/// Buffer one multipart file field into a staged upload value.
///
/// Returns `None` for an empty file part (a submitted form with an
/// untouched file input).
pub(crate) async fn buffer_file_field(field: Field<'_>) -> ApiResult<Option<StagedUpload>> {
    let filename = field.file_name().unwrap_or("photo").to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::bad_request("photo", &format!("unreadable upload: {e}")))?;

    if data.is_empty() {
        return Ok(None);
    }
    Ok(Some(StagedUpload::new(data, filename)))
}
