//! Measurement timestamp format utilities

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

use crate::error::{Result, TdpError};

/// Chrono format for measurement timestamps.
///
/// Measurement files carry UTC instants with hyphens in the time-of-day
/// part, e.g. `2024-05-01T10-15-30.0000Z`. The fractional part is optional
/// on input and omitted on output when zero.
pub const MEASUREMENT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.fZ";

/// Parse a measurement timestamp.
///
/// The trailing `Z` is literal; the instant is always interpreted as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), MEASUREMENT_TIMESTAMP_FORMAT)
        .map_err(|e| TdpError::Parse(format!("invalid timestamp '{}': {}", value, e)))?;
    Ok(naive.and_utc().fixed_offset())
}

/// Render a UTC instant in the measurement file layout.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.format(MEASUREMENT_TIMESTAMP_FORMAT).to_string()
}
