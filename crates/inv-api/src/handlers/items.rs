//! Item CRUD handlers.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use inv_core::Id;
use inv_registry::{Item, ItemPatch};
use inv_service::photo_url;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::handlers::buffer_file_field;
use crate::state::AppState;

/// Item representation on the wire, field names matching the public API.
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: Id,
    pub inventory_name: String,
    pub description: String,
    /// Stored-file key, `null` when there is no photo.
    pub photo: Option<String>,
    #[serde(rename = "photoUrl")]
    pub photo_url: Option<String>,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        let photo_url = item.attachment_ref.is_some().then(|| photo_url(item.id));
        Self {
            id: item.id,
            inventory_name: item.name,
            description: item.description,
            photo: item.attachment_ref,
            photo_url,
        }
    }
}

/// Register a new item from a multipart form.
///
/// POST /register
pub async fn register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut name = String::new();
    let mut description = String::new();
    let mut staged = None;

    let parsed = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request("body", &format!("malformed multipart: {e}")))?
        {
            let field_name = field.name().map(str::to_string);
            match field_name.as_deref() {
                Some("inventory_name") => {
                    name = field.text().await.map_err(|e| {
                        ApiError::bad_request("inventory_name", &format!("unreadable field: {e}"))
                    })?;
                }
                Some("description") => {
                    description = field.text().await.map_err(|e| {
                        ApiError::bad_request("description", &format!("unreadable field: {e}"))
                    })?;
                }
                Some("photo") => {
                    if let Some(upload) = buffer_file_field(field).await? {
                        // A repeated photo field supersedes the one
                        // staged before it.
                        if let Some(prev) = staged.take() {
                            state.items.discard_upload(prev).await;
                        }
                        staged = Some(state.items.stage_upload(upload).await?);
                    }
                }
                _ => {}
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

    let item = state.items.create_item(name, description, staged).await?;
    Ok((StatusCode::CREATED, Json(ItemResponse::from(item))))
}

/// List all items.
///
/// GET /inventory
pub async fn list(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let items = state.items.list().await?;
    let body: Vec<ItemResponse> = items.into_iter().map(ItemResponse::from).collect();
    Ok(Json(body))
}

/// Fetch a single item.
///
/// GET /inventory/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    let item = state.items.get(id).await?;
    Ok(Json(ItemResponse::from(item)))
}

/// Partial update body. Absent fields stay untouched; a supplied empty
/// string is a real value.
#[derive(Debug, Deserialize)]
pub struct UpdateItemBody {
    #[serde(alias = "inventory_name")]
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Update name and/or description.
///
/// PUT /inventory/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(body): Json<UpdateItemBody>,
) -> ApiResult<impl IntoResponse> {
    let patch = ItemPatch {
        name: body.name,
        description: body.description,
    };
    let item = state.items.update(id, patch).await?;
    Ok(Json(ItemResponse::from(item)))
}

/// Delete an item and its attachment.
///
/// DELETE /inventory/:id
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<impl IntoResponse> {
    state.items.delete_item(id).await?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}
