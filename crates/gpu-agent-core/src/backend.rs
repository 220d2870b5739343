use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{AgentConfig, GpuAgentError};

/// Vendor query mechanism. "No backend" is `Option::<Backend>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Nvidia,
    Amd,
}

impl Backend {
    /// Executable name of the vendor tool.
    pub fn tool(self) -> &'static str {
        match self {
            Backend::Nvidia => "nvidia-smi",
            Backend::Amd => "rocm-smi",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Nvidia => "nvidia",
            Backend::Amd => "amd",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator choice of backend. Anything but `Auto` skips detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendOverride {
    #[default]
    Auto,
    Nvidia,
    Amd,
}

impl FromStr for BackendOverride {
    type Err = GpuAgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(BackendOverride::Auto),
            "nvidia" => Ok(BackendOverride::Nvidia),
            "amd" => Ok(BackendOverride::Amd),
            other => Err(GpuAgentError::Config(format!(
                "unknown GPU backend '{other}', expected auto, nvidia or amd"
            ))),
        }
    }
}

impl fmt::Display for BackendOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendOverride::Auto => f.write_str("auto"),
            BackendOverride::Nvidia => f.write_str("nvidia"),
            BackendOverride::Amd => f.write_str("amd"),
        }
    }
}

/// Probes the executable search path for vendor tools.
#[derive(Debug, Clone)]
pub struct Detector {
    forced: BackendOverride,
    search_path: Option<OsString>,
}

impl Detector {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            forced: config.backend,
            search_path: config.search_path.clone(),
        }
    }

    /// A forced backend is trusted without checking the tool exists.
    /// Otherwise nvidia wins over amd when both tools are present.
    #[instrument(skip(self), fields(forced = %self.forced))]
    pub fn detect(&self) -> Option<Backend> {
        let backend = match self.forced {
            BackendOverride::Nvidia => Some(Backend::Nvidia),
            BackendOverride::Amd => Some(Backend::Amd),
            BackendOverride::Auto => [Backend::Nvidia, Backend::Amd]
                .into_iter()
                .find(|backend| self.locate(backend.tool()).is_some()),
        };
        debug!(backend = ?backend, "backend detection finished");
        backend
    }

    /// First executable named `tool` on the search path.
    pub fn locate(&self, tool: &str) -> Option<PathBuf> {
        let search_path = self
            .search_path
            .clone()
            .or_else(|| env::var_os("PATH"))?;
        let file_name = format!("{tool}{}", env::consts::EXE_SUFFIX);

        env::split_paths(&search_path)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(|dir| dir.join(&file_name))
            .find(|candidate| is_executable(candidate))
    }

    /// Path to spawn for `backend`. Falls back to the bare tool name so a
    /// forced backend without its tool fails at spawn time.
    pub fn program(&self, backend: Backend) -> PathBuf {
        self.locate(backend.tool())
            .unwrap_or_else(|| PathBuf::from(backend.tool()))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
