use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, instrument};

use super::run_tool;
use crate::gpu::{mib_to_bytes, truncate, truncate_count};
use crate::{Backend, GpuRecord, QueryError};

const ARGS: [&str; 6] = [
    "--showid",
    "--showtemp",
    "--showuse",
    "--showmeminfo",
    "vram",
    "--csv",
];

const DEFAULT_NAME: &str = "AMD GPU";

// rocm-smi has renamed its CSV columns across releases; keys are tried in order.
const NAME_KEYS: &[&str] = &["card series", "device name"];
const TEMPERATURE_KEYS: &[&str] = &["temperature (sensor edge) (c)", "temperature"];
const UTILIZATION_KEYS: &[&str] = &["gpu use (%)", "gpu usage"];
const VRAM_TOTAL_BYTES: &str = "vram total memory (b)";
const VRAM_USED_BYTES: &str = "vram total used memory (b)";
const VRAM_TOTAL_MIB: &str = "vram total";
const VRAM_USED_MIB: &str = "vram used";

#[instrument(skip(program))]
pub async fn query_amd(program: &Path, timeout: Duration) -> Result<Vec<GpuRecord>, QueryError> {
    let stdout = run_tool(Backend::Amd.tool(), program, &ARGS, timeout).await?;
    Ok(parse_amd(&stdout))
}

/// Parses `rocm-smi --csv` output: a header row followed by one row per GPU.
/// Rows whose field count differs from the header are skipped.
pub fn parse_amd(output: &str) -> Vec<GpuRecord> {
    let mut lines = output.trim().lines();
    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header
        .split(',')
        .map(|h| h.trim().to_lowercase())
        .collect();

    lines.filter_map(|line| parse_row(&headers, line)).collect()
}

fn parse_row(headers: &[String], line: &str) -> Option<GpuRecord> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != headers.len() {
        debug!(line, fields = fields.len(), expected = headers.len(), "skipping rocm-smi row");
        return None;
    }
    let row: HashMap<&str, &str> = headers.iter().map(String::as_str).zip(fields).collect();

    let record = build_record(&row);
    if record.is_none() {
        debug!(line, "skipping rocm-smi row with unreadable values");
    }
    record
}

fn build_record(row: &HashMap<&str, &str>) -> Option<GpuRecord> {
    let name = lookup(row, NAME_KEYS).unwrap_or(DEFAULT_NAME).to_string();
    let temperature = truncate(lookup(row, TEMPERATURE_KEYS).unwrap_or("0"))?;
    let utilization = truncate(lookup(row, UTILIZATION_KEYS).unwrap_or("0"))?;

    let mut memory_total = truncate_count(row.get(VRAM_TOTAL_BYTES).copied().unwrap_or("0"))?;
    let mut memory_used = truncate_count(row.get(VRAM_USED_BYTES).copied().unwrap_or("0"))?;

    // Older releases only report MiB columns.
    if memory_total == 0 {
        memory_total = mib_to_bytes(row.get(VRAM_TOTAL_MIB).copied().unwrap_or("0"))?;
        memory_used = mib_to_bytes(row.get(VRAM_USED_MIB).copied().unwrap_or("0"))?;
    }

    // Free is always derived so that total == used + free.
    let memory_free = memory_total.checked_sub(memory_used)?;

    Some(GpuRecord {
        name,
        memory_total,
        memory_used,
        memory_free,
        temperature,
        utilization,
    })
}

/// Value of the first key present in the row, even if empty.
fn lookup<'a>(row: &HashMap<&str, &'a str>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| row.get(key).copied())
}
