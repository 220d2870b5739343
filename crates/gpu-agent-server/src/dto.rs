use gpu_agent_core::Backend;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend: Option<Backend>,
}
