use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gpu_agent_core::GpuAgentError;
use serde::Serialize;
use tracing::{debug, error, warn};

#[derive(Debug)]
pub enum AppError {
    Unavailable(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl From<GpuAgentError> for AppError {
    fn from(err: GpuAgentError) -> Self {
        match err {
            GpuAgentError::NoBackend => {
                debug!("no GPU backend available");
                AppError::Unavailable(err.to_string())
            }
            GpuAgentError::Query(ref query) => {
                warn!(tool = query.tool(), error = %query, "GPU query failed");
                AppError::Internal(err.to_string())
            }
            GpuAgentError::Config(_) => {
                error!(error = %err, "GPU agent misconfigured");
                AppError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
