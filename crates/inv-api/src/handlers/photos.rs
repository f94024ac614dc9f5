//! Photo download and replacement handlers.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use inv_core::Id;

use crate::error::{ApiError, ApiResult};
use crate::handlers::{buffer_file_field, items::ItemResponse};
use crate::state::AppState;

/// Stream an item's photo bytes.
///
/// GET /inventory/:id/photo
pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let (item, data) = state.items.photo(id).await?;

    let content_type = item
        .attachment_ref
        .as_deref()
        .map(|key| {
            mime_guess::from_path(key)
                .first_or_octet_stream()
                .to_string()
        })
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok(([(header::CONTENT_TYPE, content_type)], data))
}

/// Replace an item's photo from a multipart form.
///
/// PUT /inventory/:id/photo
pub async fn replace(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut staged = None;

    let parsed = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request("body", &format!("malformed multipart: {e}")))?
        {
            if field.name() == Some("photo") {
                if let Some(upload) = buffer_file_field(field).await? {
                    if let Some(prev) = staged.take() {
                        state.items.discard_upload(prev).await;
                    }
                    staged = Some(state.items.stage_upload(upload).await?);
                }
            }
        }
        Ok::<_, ApiError>(())
    }
    .await;

    if let Err(err) = parsed {
        if let Some(prev) = staged.take() {
            state.items.discard_upload(prev).await;
        }
        return Err(err);
    }

    let staged = staged.ok_or_else(|| ApiError::bad_request("photo", "no file uploaded"))?;
    let item = state.items.replace_photo(id, staged).await?;
    Ok((StatusCode::OK, Json(ItemResponse::from(item))))
}
