//! Parsing for Kubernetes-style resource quantity strings (`"500m"`, `"2Gi"`, `"4"`).

use crate::error::SchedulerError;

/// Parses a quantity string into its base unit (cores for cpu, bytes for memory).
///
/// `""` is treated as zero. A trailing `m` is read as milli- (divides by 1000).
/// The binary suffixes `Ki`/`Mi`/`Gi` multiply by powers of 1024. A bare number
/// is returned as-is. Anything else is rejected.
pub fn parse_quantity(raw: &str) -> Result<f64, SchedulerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }

    if let Some(milli) = trimmed.strip_suffix('m') {
        return milli
            .parse::<f64>()
            .map(|v| v / 1000.0)
            .map_err(|_| SchedulerError::MalformedQuantity(raw.to_string()));
    }

    const BINARY_SUFFIXES: [(&str, f64); 3] = [
        ("Ki", 1024.0),
        ("Mi", 1024.0 * 1024.0),
        ("Gi", 1024.0 * 1024.0 * 1024.0),
    ];
    for (suffix, multiplier) in BINARY_SUFFIXES {
        if let Some(number) = trimmed.strip_suffix(suffix) {
            return number
                .parse::<f64>()
                .map(|v| v * multiplier)
                .map_err(|_| SchedulerError::MalformedQuantity(raw.to_string()));
        }
    }

    trimmed
        .parse::<f64>()
        .map_err(|_| SchedulerError::MalformedQuantity(raw.to_string()))
}
