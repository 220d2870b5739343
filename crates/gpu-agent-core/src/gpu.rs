use serde::{Deserialize, Serialize};

pub const MIB_TO_BYTES: u64 = 1024 * 1024;

/// One physical GPU as reported by the vendor tool.
///
/// Memory values are bytes. Temperature is whole degrees Celsius and
/// utilization a whole percent, both truncated from the tool's reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuRecord {
    pub name: String,
    pub memory_total: u64,
    pub memory_used: u64,
    pub memory_free: u64,
    pub temperature: i64,
    pub utilization: i64,
}

/// Parses a float reading and truncates it toward zero.
pub(crate) fn truncate(field: &str) -> Option<i64> {
    let value: f64 = field.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.trunc() as i64)
}

/// Parses a non-negative float reading into a whole count.
pub(crate) fn truncate_count(field: &str) -> Option<u64> {
    let value: f64 = field.trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(value.trunc() as u64)
}

/// Truncates a MiB reading to whole MiB before converting to bytes.
pub(crate) fn mib_to_bytes(field: &str) -> Option<u64> {
    truncate_count(field)?.checked_mul(MIB_TO_BYTES)
}
