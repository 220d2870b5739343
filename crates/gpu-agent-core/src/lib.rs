//! GPU telemetry collection for the agent sidecar.
//!
//! Detects which vendor tool is usable on the host, runs it and turns its
//! CSV output into [`GpuRecord`]s. Nothing here is cached: every call
//! re-probes the search path and re-runs the tool.

pub mod backend;
pub mod config;
pub mod error;
pub mod gpu;
pub mod query;

pub use backend::{Backend, BackendOverride, Detector};
pub use config::AgentConfig;
pub use error::{GpuAgentError, QueryError, Result};
pub use gpu::{GpuRecord, MIB_TO_BYTES};
pub use query::{collect, parse_amd, parse_nvidia, query_amd, query_nvidia};
