use std::ffi::OsString;
use std::time::Duration;

use crate::BackendOverride;

pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings read once at startup and shared read-only by every request.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub backend: BackendOverride,
    pub query_timeout: Duration,
    /// Replaces `PATH` for vendor tool lookup when set.
    pub search_path: Option<OsString>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            backend: BackendOverride::Auto,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            search_path: None,
        }
    }
}
