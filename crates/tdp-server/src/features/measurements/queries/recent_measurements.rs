//! Recent measurements query
//!
//! Returns the newest rows stored for one measurement file, ordered by
//! recording time descending.

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::validation::{
    validate_file_name, FileNameValidationError, MAX_FILE_NAME_LENGTH,
};

/// Number of rows returned when the caller does not pass a limit.
pub const DEFAULT_RECENT_LIMIT: i64 = 10;

/// Upper bound on the number of rows one query may return.
pub const MAX_RECENT_LIMIT: i64 = 1000;

/// Query to fetch the most recent measurements of a file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentMeasurementsQuery {
    /// Name of the file to read; an absent value fails validation
    #[serde(default)]
    pub file_name: String,

    /// Number of rows to return (defaults to 10, capped at 1000)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

/// One measurement row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MeasurementItem {
    pub recorded_at: DateTime<Utc>,
    pub execution_time: f64,
    pub value: f64,
}

/// Response with the newest measurements of a file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentMeasurementsResponse {
    pub file_id: Uuid,
    pub file_name: String,
    pub measurements: Vec<MeasurementItem>,
}

/// Errors that can occur when querying recent measurements
#[derive(Debug, thiserror::Error)]
pub enum RecentMeasurementsError {
    #[error("File name validation failed: {0}")]
    FileNameValidation(#[from] FileNameValidationError),

    #[error("Limit must be greater than 0")]
    InvalidLimit,

    #[error("File '{0}' not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

// Implement mediator Request trait for the query
impl Request<Result<RecentMeasurementsResponse, RecentMeasurementsError>>
    for RecentMeasurementsQuery
{
}

// Mark as Query for CQRS middleware
impl crate::cqrs::middleware::Query for RecentMeasurementsQuery {}

impl RecentMeasurementsQuery {
    /// Validates the query parameters
    #[tracing::instrument(skip(self), fields(file_name = %self.file_name))]
    pub fn validate(&self) -> Result<(), RecentMeasurementsError> {
        validate_file_name(&self.file_name, MAX_FILE_NAME_LENGTH)?;

        if matches!(self.limit, Some(limit) if limit <= 0) {
            return Err(RecentMeasurementsError::InvalidLimit);
        }

        tracing::debug!("Query validation passed");
        Ok(())
    }
}

/// Handler function for fetching recent measurements
///
/// # Errors
///
/// - `NotFound` if no file with the given name was uploaded
/// - Database errors if the query fails
#[tracing::instrument(skip(pool, query), fields(file_name = %query.file_name))]
pub async fn handle(
    pool: PgPool,
    query: RecentMeasurementsQuery,
) -> Result<RecentMeasurementsResponse, RecentMeasurementsError> {
    query.validate()?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .min(MAX_RECENT_LIMIT);

    tracing::debug!(limit, "Fetching recent measurements");

    let file_id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM files WHERE name = $1")
        .bind(&query.file_name)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| RecentMeasurementsError::NotFound(query.file_name.clone()))?;

    let measurements = sqlx::query_as::<_, MeasurementItem>(
        r#"
        SELECT recorded_at, execution_time, value
        FROM measurements
        WHERE file_id = $1
        ORDER BY recorded_at DESC
        LIMIT $2
        "#,
    )
    .bind(file_id)
    .bind(limit)
    .fetch_all(&pool)
    .await?;

    tracing::debug!(count = measurements.len(), "Fetched recent measurements");

    Ok(RecentMeasurementsResponse {
        file_id,
        file_name: query.file_name,
        measurements,
    })
}
