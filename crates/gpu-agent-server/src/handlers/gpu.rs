use std::sync::Arc;

use axum::{extract::State, Json};
use gpu_agent_core::GpuRecord;
use tracing::error;

use crate::error::AppError;
use crate::state::AppState;

pub async fn list_gpus(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GpuRecord>>, AppError> {
    // Run in its own task so a panic in the query becomes a 500.
    let task = tokio::spawn(async move { gpu_agent_core::collect(&state.config).await });

    match task.await {
        Ok(result) => Ok(Json(result?)),
        Err(e) => {
            error!("GPU query task failed: {}", e);
            Err(AppError::Internal(format!("GPU query failed: {e}")))
        }
    }
}
