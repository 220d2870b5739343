pub mod gpu;

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::dto::HealthResponse;
use crate::state::AppState;

/// Always 200; a missing backend is reported as `null`.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        backend: state.detector().detect(),
    })
}
