//! Shared validation utilities
//!
//! Provides common validation functions for measurement uploads, used by
//! commands and queries across the measurements feature.
//!
//! # Examples
//!
//! ```rust,ignore
//! use tdp_server::features::shared::validation::{
//!     validate_file_name, validate_measurement, MAX_FILE_NAME_LENGTH,
//! };
//!
//! validate_file_name("sensors.csv", MAX_FILE_NAME_LENGTH)?;
//! validate_measurement(&measurement, chrono::Utc::now())?;
//! ```

use chrono::{DateTime, Utc};
use thiserror::Error;

use tdp_common::types::NewMeasurement;

/// Maximum accepted length for an uploaded file name.
pub const MAX_FILE_NAME_LENGTH: usize = 255;

/// Earliest accepted measurement timestamp, 2000-01-01T00:00:00Z.
pub const MIN_MEASUREMENT_UNIX_SECS: i64 = 946_684_800;

/// Errors that can occur during file name validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FileNameValidationError {
    #[error("File name is required and cannot be empty")]
    Required,

    #[error("File name must be between 1 and {max_length} characters")]
    TooLong { max_length: usize },
}

/// Errors that can occur during measurement validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeasurementValidationError {
    #[error("Timestamp {timestamp} is earlier than 2000-01-01T00:00:00Z")]
    TimestampTooEarly { timestamp: DateTime<Utc> },

    #[error("Timestamp {timestamp} is in the future")]
    TimestampInFuture { timestamp: DateTime<Utc> },

    #[error("Execution time must be a non-negative number, got {execution_time}")]
    InvalidExecutionTime { execution_time: f64 },

    #[error("Value must be a non-negative number, got {value}")]
    InvalidValue { value: f64 },
}

/// Validate an uploaded file name
///
/// # Rules
/// - Must not be empty (after trimming whitespace)
/// - Must not exceed max_length characters
///
/// # Arguments
/// * `name` - The file name to validate
/// * `max_length` - Maximum allowed length (typically [`MAX_FILE_NAME_LENGTH`])
///
/// # Returns
/// Ok(()) if valid, or a FileNameValidationError
pub fn validate_file_name(name: &str, max_length: usize) -> Result<(), FileNameValidationError> {
    if name.trim().is_empty() {
        return Err(FileNameValidationError::Required);
    }

    if name.len() > max_length {
        return Err(FileNameValidationError::TooLong { max_length });
    }

    Ok(())
}

/// Validate a single measurement against the acceptance window
///
/// # Rules
/// - Timestamp must not be earlier than 2000-01-01T00:00:00Z
/// - Timestamp must not be later than `now`
/// - Execution time must be a non-negative number
/// - Value must be a non-negative number
///
/// `now` is passed in so a whole batch is checked against one instant.
/// NaN fails the numeric checks.
pub fn validate_measurement(
    measurement: &NewMeasurement,
    now: DateTime<Utc>,
) -> Result<(), MeasurementValidationError> {
    let timestamp = measurement.timestamp.with_timezone(&Utc);

    if timestamp.timestamp() < MIN_MEASUREMENT_UNIX_SECS {
        return Err(MeasurementValidationError::TimestampTooEarly { timestamp });
    }

    if timestamp > now {
        return Err(MeasurementValidationError::TimestampInFuture { timestamp });
    }

    if measurement.execution_time.is_nan() || measurement.execution_time < 0.0 {
        return Err(MeasurementValidationError::InvalidExecutionTime {
            execution_time: measurement.execution_time,
        });
    }

    if measurement.value.is_nan() || measurement.value < 0.0 {
        return Err(MeasurementValidationError::InvalidValue {
            value: measurement.value,
        });
    }

    Ok(())
}
