//! CSV parsing for measurement uploads
//!
//! Uploaded files are semicolon-delimited with a fixed header:
//!
//! ```csv
//! Date;Execution Time;Value
//! 2024-05-01T10-00-00.0000Z;100;1.1
//! ```
//!
//! Parsing stops at the first bad row and reports its position. Range
//! validation of the parsed values happens in the ingest command, not here.

use serde::Deserialize;
use thiserror::Error;

use tdp_common::timestamp;
use tdp_common::types::NewMeasurement;

/// Field separator used by measurement files.
pub const CSV_DELIMITER: u8 = b';';

/// Header row every measurement file must carry.
pub const EXPECTED_HEADERS: [&str; 3] = ["Date", "Execution Time", "Value"];

/// Raw CSV row before timestamp parsing
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Execution Time")]
    execution_time: f64,
    #[serde(rename = "Value")]
    value: f64,
}

/// Errors raised while parsing an uploaded CSV file
#[derive(Debug, Error)]
pub enum CsvParseError {
    #[error("Failed to read CSV header: {0}")]
    Header(#[source] csv::Error),

    #[error("Expected header 'Date;Execution Time;Value', got '{found}'")]
    HeaderMismatch { found: String },

    #[error("Row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("Row {row}: {message}")]
    Timestamp { row: usize, message: String },
}

impl CsvParseError {
    /// Data row the error points at, if any. Rows count from 1.
    pub fn row(&self) -> Option<usize> {
        match self {
            CsvParseError::Row { row, .. } | CsvParseError::Timestamp { row, .. } => Some(*row),
            _ => None,
        }
    }
}

/// Parse a measurement file into rows.
///
/// The returned rows are in file order and unvalidated.
pub fn parse_measurements(data: &[u8]) -> Result<Vec<NewMeasurement>, CsvParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(CSV_DELIMITER)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader.headers().map_err(CsvParseError::Header)?;
    let headers_match = headers.len() == EXPECTED_HEADERS.len()
        && headers.iter().zip(EXPECTED_HEADERS).all(|(h, e)| h == e);
    if !headers_match {
        return Err(CsvParseError::HeaderMismatch {
            found: headers.iter().collect::<Vec<_>>().join(";"),
        });
    }

    let mut measurements = Vec::new();
    for (i, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row_number = i + 1;
        let row = row.map_err(|e| CsvParseError::Row {
            row: row_number,
            source: e,
        })?;

        let parsed_timestamp = timestamp::parse_timestamp(&row.date).map_err(|e| {
            CsvParseError::Timestamp {
                row: row_number,
                message: e.to_string(),
            }
        })?;

        measurements.push(NewMeasurement::new(
            parsed_timestamp,
            row.execution_time,
            row.value,
        ));
    }

    Ok(measurements)
}
