//! Ingest measurements command
//!
//! Replaces the stored contents of one measurement file: the raw rows and
//! the precomputed summary are written together in a single transaction, so
//! readers never observe a file whose summary disagrees with its rows.

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use chrono::Utc;
use tdp_common::types::{Measurement, NewMeasurement};

use crate::features::measurements::aggregate;
use crate::features::shared::validation::{
    validate_file_name, validate_measurement, FileNameValidationError, MeasurementValidationError,
    MAX_FILE_NAME_LENGTH,
};

/// Largest number of rows accepted in one upload.
pub const MAX_BATCH_ROWS: usize = 10_000;

/// Maximum rows per INSERT statement.
pub const MAX_INSERT_BATCH_SIZE: usize = 100;

/// Command to ingest one measurement file
///
/// # Examples
///
/// ```rust,ignore
/// use tdp_server::features::measurements::commands::IngestMeasurementsCommand;
///
/// let command = IngestMeasurementsCommand {
///     file_name: "sensors.csv".to_string(),
///     measurements: rows,
///     max_records: 10_000,
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestMeasurementsCommand {
    /// Name of the uploaded file; re-uploading the same name replaces it
    pub file_name: String,

    /// Parsed rows in file order
    pub measurements: Vec<NewMeasurement>,

    /// Largest batch this command will accept
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

fn default_max_records() -> usize {
    MAX_BATCH_ROWS
}

/// Response from ingesting a measurement file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestMeasurementsResponse {
    pub file_id: Uuid,
    pub file_name: String,
    pub record_count: usize,
    /// True when an earlier upload with the same name was replaced
    pub replaced: bool,
}

/// Errors that can occur when ingesting a measurement file
#[derive(Debug, thiserror::Error)]
pub enum IngestMeasurementsError {
    #[error("File name validation failed: {0}")]
    FileNameValidation(#[from] FileNameValidationError),

    #[error("File contains no measurements")]
    Empty,

    #[error("File contains {count} measurements, the limit is {limit}")]
    TooManyRows { count: usize, limit: usize },

    #[error("Row {row}: {source}")]
    MeasurementValidation {
        row: usize,
        #[source]
        source: MeasurementValidationError,
    },

    #[error("File '{0}' was uploaded concurrently")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

// Implement mediator Request trait for the command
impl Request<Result<IngestMeasurementsResponse, IngestMeasurementsError>>
    for IngestMeasurementsCommand
{
}

// Mark as Command for CQRS middleware
impl crate::cqrs::middleware::Command for IngestMeasurementsCommand {}

impl IngestMeasurementsCommand {
    /// Validates the command parameters
    ///
    /// # Errors
    ///
    /// Returns a validation error if any part of the batch is invalid:
    /// - File name must be non-empty and at most 255 characters
    /// - The batch must contain between 1 and `max_records` rows
    /// - Every timestamp must fall between 2000-01-01T00:00:00Z and now
    /// - Execution times and values must be non-negative numbers
    #[tracing::instrument(
        skip(self),
        fields(file_name = %self.file_name, record_count = self.measurements.len())
    )]
    pub fn validate(&self) -> Result<(), IngestMeasurementsError> {
        validate_file_name(&self.file_name, MAX_FILE_NAME_LENGTH)?;

        if self.measurements.is_empty() {
            return Err(IngestMeasurementsError::Empty);
        }

        if self.measurements.len() > self.max_records {
            return Err(IngestMeasurementsError::TooManyRows {
                count: self.measurements.len(),
                limit: self.max_records,
            });
        }

        // One clock reading for the whole batch
        let now = Utc::now();
        for (i, measurement) in self.measurements.iter().enumerate() {
            validate_measurement(measurement, now).map_err(|e| {
                IngestMeasurementsError::MeasurementValidation {
                    row: i + 1,
                    source: e,
                }
            })?;
        }

        tracing::debug!("Command validation passed");
        Ok(())
    }
}

/// Handler function for ingesting a measurement file
///
/// Runs as one transaction. A row lock on the file record serializes
/// concurrent uploads of the same name; the unique constraint on the name
/// decides races between two first-time uploads.
///
/// # Errors
///
/// - Validation errors if the batch is invalid
/// - `Conflict` if another upload created the same file concurrently
/// - Database errors if the transaction fails
#[tracing::instrument(
    skip(pool, command),
    fields(
        file_name = %command.file_name,
        record_count = command.measurements.len()
    )
)]
pub async fn handle(
    pool: PgPool,
    command: IngestMeasurementsCommand,
) -> Result<IngestMeasurementsResponse, IngestMeasurementsError> {
    // Validate command
    command.validate()?;

    tracing::info!("Ingesting measurement file");

    let file_name = command.file_name;
    let measurements: Vec<Measurement> = command
        .measurements
        .into_iter()
        .map(NewMeasurement::into_utc)
        .collect();

    let summary = aggregate::summarize(&measurements).ok_or(IngestMeasurementsError::Empty)?;

    let mut tx = pool.begin().await?;

    // Lock the file row so concurrent uploads of the same name serialize
    let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM files WHERE name = $1 FOR UPDATE")
        .bind(&file_name)
        .fetch_optional(&mut *tx)
        .await?;

    let (file_id, replaced) = match existing {
        Some(file_id) => {
            sqlx::query("DELETE FROM measurements WHERE file_id = $1")
                .bind(file_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM summaries WHERE file_id = $1")
                .bind(file_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE files SET upload_time = now() WHERE id = $1")
                .bind(file_id)
                .execute(&mut *tx)
                .await?;
            (file_id, true)
        },
        None => {
            let file_id = sqlx::query_scalar::<_, Uuid>(
                "INSERT INTO files (name, upload_time) VALUES ($1, now()) RETURNING id",
            )
            .bind(&file_name)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                // Check for unique constraint violation
                if let sqlx::Error::Database(ref db_err) = e {
                    if db_err.is_unique_violation() {
                        return IngestMeasurementsError::Conflict(file_name.clone());
                    }
                }
                IngestMeasurementsError::Database(e)
            })?;
            (file_id, false)
        },
    };

    // Batch insert rows (max 100 at a time to stay clear of the parameter limit)
    for chunk in measurements.chunks(MAX_INSERT_BATCH_SIZE) {
        let mut query_builder = sqlx::QueryBuilder::new(
            "INSERT INTO measurements (file_id, recorded_at, execution_time, value) ",
        );

        query_builder.push_values(chunk, |mut b, m| {
            b.push_bind(file_id)
                .push_bind(m.timestamp)
                .push_bind(m.execution_time)
                .push_bind(m.value);
        });

        query_builder.build().execute(&mut *tx).await?;
    }

    sqlx::query(
        r#"
        INSERT INTO summaries (file_id, time_delta, min_date, avg_execution_time,
                               avg_value, median_value, max_value, min_value, last_updated)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())
        "#,
    )
    .bind(file_id)
    .bind(summary.time_delta_secs)
    .bind(summary.min_date)
    .bind(summary.avg_execution_time)
    .bind(summary.avg_value)
    .bind(summary.median_value)
    .bind(summary.max_value)
    .bind(summary.min_value)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        %file_id,
        record_count = measurements.len(),
        replaced,
        "Measurement file ingested"
    );

    Ok(IngestMeasurementsResponse {
        file_id,
        file_name,
        record_count: measurements.len(),
        replaced,
    })
}
