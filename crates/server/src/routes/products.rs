//! Catalog route handler.

use axum::{Json, extract::State};
use tracing::instrument;
use woolery_core::Product;

use crate::state::AppState;

/// Return the full, immutable product catalog.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(state.catalog().products().to_vec())
}
