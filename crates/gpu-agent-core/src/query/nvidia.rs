use std::path::Path;
use std::time::Duration;

use tracing::{debug, instrument};

use super::run_tool;
use crate::gpu::{mib_to_bytes, truncate};
use crate::{Backend, GpuRecord, QueryError};

const QUERY_ARG: &str =
    "--query-gpu=name,memory.total,memory.used,memory.free,temperature.gpu,utilization.gpu";
const FORMAT_ARG: &str = "--format=csv,noheader,nounits";
const FIELD_COUNT: usize = 6;

#[instrument(skip(program))]
pub async fn query_nvidia(
    program: &Path,
    timeout: Duration,
) -> Result<Vec<GpuRecord>, QueryError> {
    let stdout = run_tool(
        Backend::Nvidia.tool(),
        program,
        &[QUERY_ARG, FORMAT_ARG],
        timeout,
    )
    .await?;
    Ok(parse_nvidia(&stdout))
}

/// Parses `nvidia-smi` CSV (no header, no units), one GPU per line.
/// Lines without exactly six fields are skipped.
pub fn parse_nvidia(output: &str) -> Vec<GpuRecord> {
    output.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<GpuRecord> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != FIELD_COUNT {
        debug!(line, fields = fields.len(), "skipping nvidia-smi line");
        return None;
    }

    let record = (|| {
        Some(GpuRecord {
            name: fields[0].to_string(),
            memory_total: mib_to_bytes(fields[1])?,
            memory_used: mib_to_bytes(fields[2])?,
            memory_free: mib_to_bytes(fields[3])?,
            temperature: truncate(fields[4])?,
            utilization: truncate(fields[5])?,
        })
    })();

    if record.is_none() {
        debug!(line, "skipping nvidia-smi line with unreadable values");
    }
    record
}
