//! Route declarations.

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{items, photos, search};
use crate::state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/register", post(items::register))
        .route("/inventory", get(items::list))
        .route(
            "/inventory/:id",
            get(items::get).put(items::update).delete(items::remove),
        )
        .route(
            "/inventory/:id/photo",
            get(photos::download).put(photos::replace),
        )
        .route("/search", get(search::by_query).post(search::by_form))
        .with_state(state)
}
