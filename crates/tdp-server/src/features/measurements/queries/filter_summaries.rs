//! Filter summaries query
//!
//! Lists precomputed per-file summaries, optionally narrowed by file name,
//! upload window, and bounds on the stored averages.

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Query to list file summaries matching a set of optional filters
///
/// Every field is optional; an empty query returns every stored summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSummariesQuery {
    /// Substring match against the file name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Only files uploaded at or after this instant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_after: Option<DateTime<Utc>>,

    /// Only files uploaded at or before this instant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_before: Option<DateTime<Utc>>,

    /// Lower bound on the average value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_avg_value: Option<f64>,

    /// Upper bound on the average value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_avg_value: Option<f64>,

    /// Lower bound on the average execution time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_avg_execution_time: Option<f64>,

    /// Upper bound on the average execution time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_avg_execution_time: Option<f64>,
}

/// One file summary
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SummaryItem {
    pub file_id: Uuid,
    pub file_name: String,
    pub upload_time: DateTime<Utc>,
    pub min_date: DateTime<Utc>,
    pub time_delta: f64,
    pub avg_execution_time: f64,
    pub avg_value: f64,
    pub median_value: f64,
    pub max_value: f64,
    pub min_value: f64,
    pub last_updated: DateTime<Utc>,
}

/// Response with summaries matching the filters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSummariesResponse {
    pub summaries: Vec<SummaryItem>,
}

/// Errors that can occur when filtering summaries
#[derive(Debug, thiserror::Error)]
pub enum FilterSummariesError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

// Implement mediator Request trait for the query
impl Request<Result<FilterSummariesResponse, FilterSummariesError>> for FilterSummariesQuery {}

// Mark as Query for CQRS middleware
impl crate::cqrs::middleware::Query for FilterSummariesQuery {}

/// Handler function for listing summaries
///
/// Unset filters are passed as NULL and skipped inside the query, so one
/// statement serves every filter combination.
///
/// # Errors
///
/// Database errors if the query fails
#[tracing::instrument(skip(pool, query))]
pub async fn handle(
    pool: PgPool,
    query: FilterSummariesQuery,
) -> Result<FilterSummariesResponse, FilterSummariesError> {
    tracing::debug!("Filtering summaries");

    let summaries = sqlx::query_as::<_, SummaryItem>(
        r#"
        SELECT s.file_id, f.name AS file_name, f.upload_time,
               s.min_date, s.time_delta, s.avg_execution_time, s.avg_value,
               s.median_value, s.max_value, s.min_value, s.last_updated
        FROM summaries s
        JOIN files f ON f.id = s.file_id
        WHERE ($1::text IS NULL OR f.name LIKE '%' || $1 || '%')
          AND ($2::timestamptz IS NULL OR f.upload_time >= $2)
          AND ($3::timestamptz IS NULL OR f.upload_time <= $3)
          AND ($4::float8 IS NULL OR s.avg_value >= $4)
          AND ($5::float8 IS NULL OR s.avg_value <= $5)
          AND ($6::float8 IS NULL OR s.avg_execution_time >= $6)
          AND ($7::float8 IS NULL OR s.avg_execution_time <= $7)
        ORDER BY f.name
        "#,
    )
    .bind(query.file_name.as_deref())
    .bind(query.uploaded_after)
    .bind(query.uploaded_before)
    .bind(query.min_avg_value)
    .bind(query.max_avg_value)
    .bind(query.min_avg_execution_time)
    .bind(query.max_avg_execution_time)
    .fetch_all(&pool)
    .await?;

    tracing::debug!(count = summaries.len(), "Filtered summaries");

    Ok(FilterSummariesResponse { summaries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::measurements::commands::ingest::{
        self, IngestMeasurementsCommand, MAX_BATCH_ROWS,
    };
    use chrono::{Duration, TimeZone};
    use tdp_common::types::NewMeasurement;

    fn measurement(offset_ms: i64, execution_time: f64, value: f64) -> NewMeasurement {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        NewMeasurement::new(
            (base + Duration::milliseconds(offset_ms)).fixed_offset(),
            execution_time,
            value,
        )
    }

    async fn seed_file(pool: &PgPool, file_name: &str, measurements: Vec<NewMeasurement>) {
        ingest::handle(
            pool.clone(),
            IngestMeasurementsCommand {
                file_name: file_name.to_string(),
                measurements,
                max_records: MAX_BATCH_ROWS,
            },
        )
        .await
        .unwrap();
    }

    /// Seeds two files: alpha.csv averages (exec 10, value 1) and
    /// beta.csv averages (exec 100, value 50).
    async fn seed_two_files(pool: &PgPool) {
        seed_file(
            pool,
            "alpha.csv",
            vec![measurement(0, 5.0, 0.5), measurement(1000, 15.0, 1.5)],
        )
        .await;
        seed_file(
            pool,
            "beta.csv",
            vec![measurement(0, 50.0, 25.0), measurement(1000, 150.0, 75.0)],
        )
        .await;
    }

    #[test]
    fn test_default_query_has_no_filters() {
        let query = FilterSummariesQuery::default();
        assert!(query.file_name.is_none());
        assert!(query.uploaded_after.is_none());
        assert!(query.uploaded_before.is_none());
        assert!(query.min_avg_value.is_none());
        assert!(query.max_avg_value.is_none());
        assert!(query.min_avg_execution_time.is_none());
        assert!(query.max_avg_execution_time.is_none());
    }

    #[test]
    fn test_unset_filters_are_not_serialized() {
        let query = FilterSummariesQuery {
            file_name: Some("alpha".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json, serde_json::json!({"file_name": "alpha"}));
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore] // Requires database
    async fn test_handle_empty_filter_returns_all(pool: PgPool) -> sqlx::Result<()> {
        seed_two_files(&pool).await;

        let response = handle(pool, FilterSummariesQuery::default()).await.unwrap();
        assert_eq!(response.summaries.len(), 2);
        assert_eq!(response.summaries[0].file_name, "alpha.csv");
        assert_eq!(response.summaries[1].file_name, "beta.csv");
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore] // Requires database
    async fn test_handle_filters_by_name_substring(pool: PgPool) -> sqlx::Result<()> {
        seed_two_files(&pool).await;

        let response = handle(
            pool,
            FilterSummariesQuery {
                file_name: Some("alph".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(response.summaries.len(), 1);
        assert_eq!(response.summaries[0].file_name, "alpha.csv");
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore] // Requires database
    async fn test_handle_filters_by_avg_value_range(pool: PgPool) -> sqlx::Result<()> {
        seed_two_files(&pool).await;

        let response = handle(
            pool,
            FilterSummariesQuery {
                min_avg_value: Some(10.0),
                max_avg_value: Some(100.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(response.summaries.len(), 1);
        assert_eq!(response.summaries[0].file_name, "beta.csv");
        assert_eq!(response.summaries[0].avg_value, 50.0);
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore] // Requires database
    async fn test_handle_filters_by_upload_window(pool: PgPool) -> sqlx::Result<()> {
        seed_two_files(&pool).await;

        let recent = handle(
            pool.clone(),
            FilterSummariesQuery {
                uploaded_after: Some(Utc::now() - Duration::hours(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(recent.summaries.len(), 2);

        let stale = handle(
            pool,
            FilterSummariesQuery {
                uploaded_before: Some(Utc::now() - Duration::hours(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(stale.summaries.is_empty());
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore] // Requires database
    async fn test_handle_no_match_returns_empty(pool: PgPool) -> sqlx::Result<()> {
        seed_two_files(&pool).await;

        let response = handle(
            pool,
            FilterSummariesQuery {
                min_avg_execution_time: Some(1_000.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(response.summaries.is_empty());
        Ok(())
    }
}
