use std::sync::Arc;

use axum::{extract::State, Json};

use crate::models::ToneResponse;
use crate::state::AppState;

/// List the selectable tones in display order
#[utoipa::path(
    get,
    path = "/api/tones",
    tag = "images",
    responses(
        (status = 200, description = "Available tones", body = [ToneResponse])
    )
)]
pub async fn list_tones(State(state): State<Arc<AppState>>) -> Json<Vec<ToneResponse>> {
    let tones = state
        .grading
        .registry
        .tones()
        .into_iter()
        .map(ToneResponse::from)
        .collect();
    Json(tones)
}
