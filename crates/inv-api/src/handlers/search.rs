//! Search handlers.
//!
//! Both entry points parse the id and the include-photo flag themselves
//! so a missing or unparsable id surfaces as a validation failure, then
//! delegate to the read-only search service.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Form, Json,
};
use inv_core::Id;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

fn parse_id(raw: Option<&str>) -> ApiResult<Id> {
    raw.and_then(|s| s.parse().ok())
        .ok_or_else(|| ApiError::bad_request("id", "is required"))
}

fn truthy(flag: Option<&str>) -> bool {
    matches!(flag, Some("true") | Some("on"))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub id: Option<String>,
    #[serde(rename = "includePhoto")]
    pub include_photo: Option<String>,
}

/// GET /search?id=1&includePhoto=on
pub async fn by_query(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(query.id.as_deref())?;
    let include_photo = truthy(query.include_photo.as_deref());

    let projection = state.search.find_by_id(id, include_photo).await?;
    Ok(Json(projection))
}

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    pub id: Option<String>,
    pub has_photo: Option<String>,
}

/// POST /search (application/x-www-form-urlencoded)
pub async fn by_form(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(form.id.as_deref())?;
    let include_photo = truthy(form.has_photo.as_deref());

    let projection = state.search.find_by_id(id, include_photo).await?;
    Ok(Json(projection))
}
