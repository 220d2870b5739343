//! Vendor tool invocation and the per-request collection flow.

mod amd;
mod nvidia;

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, instrument};

use crate::{AgentConfig, Backend, Detector, GpuAgentError, GpuRecord, QueryError, Result};

pub use amd::{parse_amd, query_amd};
pub use nvidia::{parse_nvidia, query_nvidia};

/// Detects the backend and queries its tool. Nothing is cached between calls.
#[instrument(skip(config))]
pub async fn collect(config: &AgentConfig) -> Result<Vec<GpuRecord>> {
    let detector = Detector::new(config);
    let backend = detector.detect().ok_or(GpuAgentError::NoBackend)?;
    let program = detector.program(backend);

    let gpus = match backend {
        Backend::Nvidia => query_nvidia(&program, config.query_timeout).await?,
        Backend::Amd => query_amd(&program, config.query_timeout).await?,
    };
    debug!(%backend, count = gpus.len(), "collected GPU records");
    Ok(gpus)
}

/// Runs a vendor tool to completion and returns its stdout.
pub(crate) async fn run_tool(
    tool: &'static str,
    program: &Path,
    args: &[&str],
    timeout: Duration,
) -> std::result::Result<String, QueryError> {
    debug!(tool, program = %program.display(), ?args, "running vendor tool");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| QueryError::Spawn { tool, source })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => return Err(QueryError::Spawn { tool, source }),
        Err(_) => return Err(QueryError::Timeout { tool, timeout }),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stderr = if stderr.is_empty() {
            format!("exited with {}", output.status)
        } else {
            stderr
        };
        return Err(QueryError::Failed { tool, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
