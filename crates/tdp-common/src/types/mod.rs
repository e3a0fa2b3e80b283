//! Common measurement types used across TDP

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// A single measurement row as it arrives from an upload.
///
/// The timestamp keeps whatever zone qualifier the caller supplied. Ingest
/// normalizes it to UTC before anything is compared, aggregated, or stored;
/// nothing downstream of the ingest command ever sees a non-UTC instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMeasurement {
    /// Zone-qualified instant the measurement was taken
    pub timestamp: DateTime<FixedOffset>,

    /// Duration of the measured operation, in seconds (non-negative)
    pub execution_time: f64,

    /// Measured value (non-negative)
    pub value: f64,
}

impl NewMeasurement {
    pub fn new(timestamp: DateTime<FixedOffset>, execution_time: f64, value: f64) -> Self {
        Self {
            timestamp,
            execution_time,
            value,
        }
    }

    /// Normalize the timestamp to UTC, producing the stored form.
    pub fn into_utc(self) -> Measurement {
        Measurement {
            timestamp: self.timestamp.with_timezone(&Utc),
            execution_time: self.execution_time,
            value: self.value,
        }
    }
}

/// A measurement in stored form: timestamp normalized to UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// UTC instant the measurement was taken
    pub timestamp: DateTime<Utc>,

    /// Duration of the measured operation, in seconds
    pub execution_time: f64,

    /// Measured value
    pub value: f64,
}

impl Measurement {
    pub fn new(timestamp: DateTime<Utc>, execution_time: f64, value: f64) -> Self {
        Self {
            timestamp,
            execution_time,
            value,
        }
    }
}
