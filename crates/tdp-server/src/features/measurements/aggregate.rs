//! Summary statistics over a batch of measurements
//!
//! Everything here is pure. The ingest command computes a [`Summary`] from
//! the validated batch and persists it alongside the raw rows, so reads
//! never aggregate on the fly.

use chrono::{DateTime, Utc};

use tdp_common::types::Measurement;

/// Relative magnitude gap beyond which averaging the two middle values of an
/// even-length batch would lose the smaller one to rounding.
const MEDIAN_MAGNITUDE_GAP: f64 = 1e15;

/// Aggregated view of one measurement file.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Earliest measurement timestamp in the batch
    pub min_date: DateTime<Utc>,
    /// Seconds between the earliest and latest timestamps
    pub time_delta_secs: f64,
    /// Mean execution time
    pub avg_execution_time: f64,
    /// Mean value
    pub avg_value: f64,
    /// Median value
    pub median_value: f64,
    /// Largest value
    pub max_value: f64,
    /// Smallest value
    pub min_value: f64,
}

/// Compute the summary for a batch of measurements.
///
/// The batch does not need to be ordered. Returns `None` for an empty
/// batch; a file with no rows has no summary.
pub fn summarize(measurements: &[Measurement]) -> Option<Summary> {
    let first = measurements.first()?;

    let mut min_ts = first.timestamp;
    let mut max_ts = first.timestamp;
    let mut min_value = first.value;
    let mut max_value = first.value;
    let mut sum_execution_time = 0.0;
    let mut sum_value = 0.0;

    for m in measurements {
        min_ts = min_ts.min(m.timestamp);
        max_ts = max_ts.max(m.timestamp);
        min_value = min_value.min(m.value);
        max_value = max_value.max(m.value);
        sum_execution_time += m.execution_time;
        sum_value += m.value;
    }

    let count = measurements.len() as f64;
    let time_delta_secs =
        (max_ts.timestamp_micros() - min_ts.timestamp_micros()) as f64 / 1_000_000.0;

    let mut values: Vec<f64> = measurements.iter().map(|m| m.value).collect();
    values.sort_by(f64::total_cmp);

    Some(Summary {
        min_date: min_ts,
        time_delta_secs,
        avg_execution_time: sum_execution_time / count,
        avg_value: sum_value / count,
        median_value: median_of_sorted(&values)?,
        max_value,
        min_value,
    })
}

/// Median of an ascending-sorted slice.
///
/// Odd lengths take the middle element. Even lengths average the two middle
/// values, except when the average would misrepresent them: if one middle
/// value dwarfs the other by more than [`MEDIAN_MAGNITUDE_GAP`] or their sum
/// overflows to infinity, the larger value is taken instead.
fn median_of_sorted(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        return Some(values[mid]);
    }

    let first = values[mid - 1];
    let second = values[mid];

    if first.abs() > second.abs() * MEDIAN_MAGNITUDE_GAP
        || second.abs() > first.abs() * MEDIAN_MAGNITUDE_GAP
    {
        return Some(first.max(second));
    }

    let sum = first + second;
    if sum.is_infinite() {
        return Some(first.max(second));
    }

    Some(sum / 2.0)
}
