//! Measurement API routes
//!
//! This module wires the CQRS commands and queries to Axum HTTP handlers,
//! providing a RESTful API for measurement ingest and retrieval.
//!
//! # Route Structure
//!
//! - `POST /api/v1/measurements/upload` - Upload a measurement CSV file
//! - `GET /api/v1/measurements/recent` - Newest rows of one file
//! - `GET /api/v1/measurements/summaries` - Filtered per-file summaries
//!
//! # Examples
//!
//! ## Creating a Router
//!
//! ```rust,ignore
//! use axum::Router;
//! use tdp_server::features::measurements::routes::measurements_routes;
//!
//! let app = Router::new()
//!     .nest("/api/v1/measurements", measurements_routes())
//!     .with_state(pool);
//! ```

use crate::api::response::{ApiResponse, ErrorResponse};
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;

use super::{
    commands::{ingest::MAX_BATCH_ROWS, IngestMeasurementsCommand, IngestMeasurementsError},
    parser::{self, CsvParseError},
    queries::{
        FilterSummariesError, FilterSummariesQuery, RecentMeasurementsError,
        RecentMeasurementsQuery,
    },
};

/// Largest accepted upload body in bytes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// ============================================================================
// Router Configuration
// ============================================================================

/// Creates the measurements router with all routes configured
///
/// # Examples
///
/// ```rust,ignore
/// use axum::Router;
/// use tdp_server::features::measurements::routes::measurements_routes;
///
/// let app = Router::new()
///     .nest("/api/v1/measurements", measurements_routes())
///     .with_state(pool);
/// ```
pub fn measurements_routes() -> Router<PgPool> {
    Router::new()
        .route(
            "/upload",
            post(upload_measurements).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/recent", get(recent_measurements))
        .route("/summaries", get(filter_summaries))
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

/// Upload a measurement CSV file
///
/// The file travels as a multipart field named `file`; the stored file name
/// is taken from that field's filename. Re-uploading a name replaces the
/// earlier contents.
///
/// # Endpoint
///
/// `POST /api/v1/measurements/upload`
///
/// # Response
///
/// - `201 Created` - File ingested, raw rows and summary stored
/// - `400 Bad Request` - Malformed multipart, CSV, or validation error
/// - `409 Conflict` - Concurrent upload of the same file name
/// - `413 Payload Too Large` - Body exceeds the upload limit
/// - `500 Internal Server Error` - Database error
#[tracing::instrument(skip(pool, multipart))]
async fn upload_measurements(
    State(pool): State<PgPool>,
    mut multipart: Multipart,
) -> Result<Response, MeasurementsApiError> {
    let mut file_name: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(MeasurementsApiError::Multipart)?
    {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name == "file" {
            file_name = field.file_name().map(|s| s.to_string());
            let data = field
                .bytes()
                .await
                .map_err(MeasurementsApiError::Multipart)?;
            content = Some(data.to_vec());
        }
    }

    let content = content.ok_or(MeasurementsApiError::MissingFile)?;
    let file_name = file_name.ok_or(MeasurementsApiError::MissingFileName)?;

    let measurements =
        parser::parse_measurements(&content).map_err(MeasurementsApiError::ParseError)?;

    let command = IngestMeasurementsCommand {
        file_name,
        measurements,
        max_records: MAX_BATCH_ROWS,
    };

    let response = super::commands::ingest::handle(pool, command).await?;

    tracing::info!(
        file_id = %response.file_id,
        record_count = response.record_count,
        replaced = response.replaced,
        "Measurement file uploaded via API"
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

/// Get the newest measurements of one file
///
/// # Endpoint
///
/// `GET /api/v1/measurements/recent?file_name=sensors.csv&limit=10`
///
/// # Query Parameters
///
/// - `file_name` - Name of the uploaded file (required)
/// - `limit` - Number of rows to return (default: 10, max: 1000)
///
/// # Response
///
/// - `200 OK` - Newest rows, recording time descending
/// - `400 Bad Request` - Missing file name or non-positive limit
/// - `404 Not Found` - No file with that name
/// - `500 Internal Server Error` - Database error
#[tracing::instrument(skip(pool, query), fields(file_name = %query.file_name))]
async fn recent_measurements(
    State(pool): State<PgPool>,
    Query(query): Query<RecentMeasurementsQuery>,
) -> Result<Response, MeasurementsApiError> {
    let response = super::queries::recent_measurements::handle(pool, query).await?;

    tracing::debug!(
        file_id = %response.file_id,
        count = response.measurements.len(),
        "Recent measurements retrieved via API"
    );

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

/// List file summaries matching a set of optional filters
///
/// # Endpoint
///
/// `GET /api/v1/measurements/summaries?file_name=sensors&min_avg_value=1.5`
///
/// # Query Parameters
///
/// - `file_name` - Substring match against the file name
/// - `uploaded_after` / `uploaded_before` - Upload time window (RFC 3339)
/// - `min_avg_value` / `max_avg_value` - Bounds on the average value
/// - `min_avg_execution_time` / `max_avg_execution_time` - Bounds on the
///   average execution time
///
/// # Response
///
/// - `200 OK` - Matching summaries with a count in the meta object
/// - `500 Internal Server Error` - Database error
#[tracing::instrument(skip(pool, query), fields(file_name = ?query.file_name))]
async fn filter_summaries(
    State(pool): State<PgPool>,
    Query(query): Query<FilterSummariesQuery>,
) -> Result<Response, MeasurementsApiError> {
    let response = super::queries::filter_summaries::handle(pool, query).await?;

    tracing::debug!(count = response.summaries.len(), "Summaries listed via API");

    let meta = json!({
        "count": response.summaries.len()
    });

    Ok(
        (StatusCode::OK, Json(ApiResponse::success_with_meta(response.summaries, meta)))
            .into_response(),
    )
}

// ============================================================================
// Error Handling
// ============================================================================

/// Unified error type for measurement API endpoints
#[derive(Debug)]
enum MeasurementsApiError {
    Multipart(MultipartError),
    MissingFile,
    MissingFileName,
    ParseError(CsvParseError),
    IngestError(IngestMeasurementsError),
    RecentError(RecentMeasurementsError),
    SummariesError(FilterSummariesError),
}

impl From<IngestMeasurementsError> for MeasurementsApiError {
    fn from(err: IngestMeasurementsError) -> Self {
        Self::IngestError(err)
    }
}

impl From<RecentMeasurementsError> for MeasurementsApiError {
    fn from(err: RecentMeasurementsError) -> Self {
        Self::RecentError(err)
    }
}

impl From<FilterSummariesError> for MeasurementsApiError {
    fn from(err: FilterSummariesError) -> Self {
        Self::SummariesError(err)
    }
}

impl IntoResponse for MeasurementsApiError {
    fn into_response(self) -> Response {
        match self {
            // Upload transport errors
            MeasurementsApiError::Multipart(ref multipart_err) => {
                let status = multipart_err.status();
                if status == StatusCode::PAYLOAD_TOO_LARGE {
                    let error = ErrorResponse::new(
                        "PAYLOAD_TOO_LARGE",
                        "Uploaded file exceeds the size limit",
                    );
                    (status, Json(error)).into_response()
                } else {
                    let error = ErrorResponse::new("VALIDATION_ERROR", self.to_string());
                    (StatusCode::BAD_REQUEST, Json(error)).into_response()
                }
            },
            MeasurementsApiError::MissingFile | MeasurementsApiError::MissingFileName => {
                let error = ErrorResponse::new("VALIDATION_ERROR", self.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            MeasurementsApiError::ParseError(ref parse_err) => {
                let error = match parse_err.row() {
                    Some(row) => ErrorResponse::with_details(
                        "VALIDATION_ERROR",
                        self.to_string(),
                        json!({ "row": row }),
                    ),
                    None => ErrorResponse::new("VALIDATION_ERROR", self.to_string()),
                };
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },

            // Ingest errors
            MeasurementsApiError::IngestError(IngestMeasurementsError::FileNameValidation(_))
            | MeasurementsApiError::IngestError(IngestMeasurementsError::Empty)
            | MeasurementsApiError::IngestError(IngestMeasurementsError::TooManyRows { .. })
            | MeasurementsApiError::IngestError(
                IngestMeasurementsError::MeasurementValidation { .. },
            ) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", self.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            MeasurementsApiError::IngestError(IngestMeasurementsError::Conflict(name)) => {
                let error = ErrorResponse::new(
                    "CONFLICT",
                    format!("File '{}' was uploaded concurrently", name),
                );
                (StatusCode::CONFLICT, Json(error)).into_response()
            },
            MeasurementsApiError::IngestError(IngestMeasurementsError::Database(_)) => {
                tracing::error!("Database error during measurement upload: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },

            // Recent measurement errors
            MeasurementsApiError::RecentError(RecentMeasurementsError::FileNameValidation(_))
            | MeasurementsApiError::RecentError(RecentMeasurementsError::InvalidLimit) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", self.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            MeasurementsApiError::RecentError(RecentMeasurementsError::NotFound(name)) => {
                let error =
                    ErrorResponse::new("NOT_FOUND", format!("File '{}' not found", name));
                (StatusCode::NOT_FOUND, Json(error)).into_response()
            },
            MeasurementsApiError::RecentError(RecentMeasurementsError::Database(_)) => {
                tracing::error!("Database error during recent measurements query: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },

            // Summary errors
            MeasurementsApiError::SummariesError(FilterSummariesError::Database(_)) => {
                tracing::error!("Database error during summaries query: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
        }
    }
}

impl std::fmt::Display for MeasurementsApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Multipart(e) => write!(f, "Invalid multipart upload: {}", e),
            Self::MissingFile => write!(f, "No file field found in multipart data"),
            Self::MissingFileName => write!(f, "Uploaded file has no file name"),
            Self::ParseError(e) => write!(f, "{}", e),
            Self::IngestError(e) => write!(f, "{}", e),
            Self::RecentError(e) => write!(f, "{}", e),
            Self::SummariesError(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MeasurementsApiError::MissingFile;
        assert!(err.to_string().contains("No file field"));

        let err = MeasurementsApiError::IngestError(IngestMeasurementsError::Empty);
        assert!(err.to_string().contains("no measurements"));
    }

    #[test]
    fn test_routes_structure() {
        let router = measurements_routes();
        assert!(format!("{:?}", router).contains("Router"));
    }
}
