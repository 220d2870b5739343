use gpu_agent_core::{AgentConfig, Detector};

/// Immutable per-process configuration handed to every request.
pub struct AppState {
    pub config: AgentConfig,
}

impl AppState {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    pub fn detector(&self) -> Detector {
        Detector::new(&self.config)
    }
}
