use std::time::Duration;

use thiserror::Error;

/// Failure of a single vendor tool invocation.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("{tool} failed to start: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} timed out after {timeout:?}")]
    Timeout {
        tool: &'static str,
        timeout: Duration,
    },

    #[error("{tool} failed: {stderr}")]
    Failed { tool: &'static str, stderr: String },
}

impl QueryError {
    pub fn tool(&self) -> &'static str {
        match self {
            QueryError::Spawn { tool, .. }
            | QueryError::Timeout { tool, .. }
            | QueryError::Failed { tool, .. } => tool,
        }
    }
}

#[derive(Error, Debug)]
pub enum GpuAgentError {
    #[error("No GPU backend available. Install nvidia-smi or rocm-smi.")]
    NoBackend,

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GpuAgentError>;
