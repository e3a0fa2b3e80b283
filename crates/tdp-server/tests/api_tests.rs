//! API integration tests for the TDP server
//!
//! Exercises the HTTP surface end to end: routing, request parsing,
//! response envelopes, and error mapping.
//!
//! Coverage includes:
//! - Root and health endpoints
//! - Measurement file upload (multipart handling, CSV validation)
//! - Recent measurement reads
//! - Summary filtering
//! - Error envelopes (400, 404, 500)
//!
//! Tests that need PostgreSQL are marked `#[ignore]`; the rest run against
//! a router whose pool never connects, exercising every path that fails
//! before the database is reached.

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::ServiceExt;

use tdp_server::api::{self, AppState};
use tdp_server::config::Config;

// ============================================================================
// Helper Functions
// ============================================================================

const MULTIPART_BOUNDARY: &str = "tdp-test-boundary";

const VALID_CSV: &str = "Date;Execution Time;Value\n\
    2024-01-02T10-00-00.0000Z;100.5;1.25\n\
    2024-01-02T10-00-01.0000Z;200.0;2.5\n";

/// Full router over the given pool, with default middleware
fn create_test_app(pool: PgPool) -> Router {
    let config = Config::default();
    api::create_router(AppState { db: pool }, &config)
}

/// Create a test app whose pool points at a closed port.
///
/// Requests only reach the pool after validation and parsing, so these
/// paths are fully testable without a database.
fn create_offline_app() -> Router {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy("postgres://localhost:1/tdp")
        .unwrap();
    create_test_app(pool)
}

/// Send a GET and collect status plus body text
async fn get_request(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_str = String::from_utf8(body.to_vec()).unwrap();

    (status, body_str)
}

/// Builds a multipart body with a single field named `field_name`.
fn multipart_body(field_name: &str, file_name: Option<&str>, content: &str) -> (String, String) {
    let content_type = format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY);
    let disposition = match file_name {
        Some(name) => format!("form-data; name=\"{}\"; filename=\"{}\"", field_name, name),
        None => format!("form-data; name=\"{}\"", field_name),
    };
    let body = format!(
        "--{boundary}\r\nContent-Disposition: {disposition}\r\nContent-Type: text/csv\r\n\r\n{content}\r\n--{boundary}--\r\n",
        boundary = MULTIPART_BOUNDARY,
        disposition = disposition,
        content = content
    );
    (content_type, body)
}

/// Helper to POST a file to the upload endpoint
async fn upload_request(
    app: &Router,
    field_name: &str,
    file_name: Option<&str>,
    content: &str,
) -> (StatusCode, String) {
    let (content_type, body) = multipart_body(field_name, file_name, content);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/measurements/upload")
                .method("POST")
                .header("content-type", content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let response_body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_str = String::from_utf8(response_body.to_vec()).unwrap();

    (status, body_str)
}

// ============================================================================
// Root and Health Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_root_endpoint() {
    let app = create_offline_app();

    let (status, body) = get_request(&app, "/").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["name"], "TDP Server");
    assert!(json.get("version").is_some());
    assert_eq!(json["status"], "running");
}

#[tokio::test]
async fn test_health_endpoint_without_database() {
    let app = create_offline_app();

    let (status, _body) = get_request(&app, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_health_endpoint(pool: PgPool) -> sqlx::Result<()> {
    let app = create_test_app(pool);

    let (status, body) = get_request(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["database"], "connected");

    Ok(())
}

// ============================================================================
// Upload Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_upload_without_file_field() {
    let app = create_offline_app();

    let (status, body) = upload_request(&app, "meta", Some("a.csv"), "ignored").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("No file field"));
}

#[tokio::test]
async fn test_upload_without_file_name() {
    let app = create_offline_app();

    let (status, body) = upload_request(&app, "file", None, VALID_CSV).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("no file name"));
}

#[tokio::test]
async fn test_upload_with_wrong_header() {
    let app = create_offline_app();

    let csv = "Time;Exec;Val\n2024-01-02T10-00-00.0000Z;1.0;2.0\n";
    let (status, body) = upload_request(&app, "file", Some("a.csv"), csv).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    assert!(json["error"].get("details").is_none());
}

#[tokio::test]
async fn test_upload_with_bad_row_reports_row_number() {
    let app = create_offline_app();

    let csv = "Date;Execution Time;Value\n\
        2024-01-02T10-00-00.0000Z;100.5;1.25\n\
        not-a-date;1.0;2.0\n";
    let (status, body) = upload_request(&app, "file", Some("a.csv"), csv).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"]["details"]["row"], 2);
}

#[tokio::test]
async fn test_upload_valid_file_without_database() {
    let app = create_offline_app();

    let (status, body) = upload_request(&app, "file", Some("a.csv"), VALID_CSV).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["code"], "INTERNAL_ERROR");
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_upload_and_read_flow(pool: PgPool) -> sqlx::Result<()> {
    let app = create_test_app(pool);

    let (status, body) = upload_request(&app, "file", Some("sensors.csv"), VALID_CSV).await;
    assert_eq!(status, StatusCode::CREATED);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["file_name"], "sensors.csv");
    assert_eq!(json["data"]["record_count"], 2);
    assert_eq!(json["data"]["replaced"], false);

    let (status, body) =
        get_request(&app, "/api/v1/measurements/recent?file_name=sensors.csv&limit=5").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let rows = json["data"]["measurements"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["value"], 2.5);
    assert_eq!(rows[1]["value"], 1.25);

    let (status, body) = get_request(&app, "/api/v1/measurements/summaries").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["meta"]["count"], 1);
    let summaries = json["data"].as_array().unwrap();
    assert_eq!(summaries[0]["file_name"], "sensors.csv");
    assert_eq!(summaries[0]["avg_execution_time"], 150.25);

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_reupload_replaces_file(pool: PgPool) -> sqlx::Result<()> {
    let app = create_test_app(pool);

    let (status, _body) = upload_request(&app, "file", Some("sensors.csv"), VALID_CSV).await;
    assert_eq!(status, StatusCode::CREATED);

    let csv = "Date;Execution Time;Value\n2024-03-01T08-30-00.0000Z;50.0;9.0\n";
    let (status, body) = upload_request(&app, "file", Some("sensors.csv"), csv).await;
    assert_eq!(status, StatusCode::CREATED);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["data"]["replaced"], true);
    assert_eq!(json["data"]["record_count"], 1);

    let (status, body) =
        get_request(&app, "/api/v1/measurements/recent?file_name=sensors.csv").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let rows = json["data"]["measurements"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["value"], 9.0);

    Ok(())
}

// ============================================================================
// Recent Measurements Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_recent_without_file_name() {
    let app = create_offline_app();

    let (status, body) = get_request(&app, "/api/v1/measurements/recent").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_recent_with_zero_limit() {
    let app = create_offline_app();

    let (status, body) =
        get_request(&app, "/api/v1/measurements/recent?file_name=a.csv&limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Limit"));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_recent_unknown_file(pool: PgPool) -> sqlx::Result<()> {
    let app = create_test_app(pool);

    let (status, body) =
        get_request(&app, "/api/v1/measurements/recent?file_name=missing.csv").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["code"], "NOT_FOUND");
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("missing.csv"));

    Ok(())
}

// ============================================================================
// Summaries Endpoint Tests
// ============================================================================

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_summaries_empty_database(pool: PgPool) -> sqlx::Result<()> {
    let app = create_test_app(pool);

    let (status, body) = get_request(&app, "/api/v1/measurements/summaries").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["meta"]["count"], 0);
    assert!(json["data"].as_array().unwrap().is_empty());

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_summaries_value_filter(pool: PgPool) -> sqlx::Result<()> {
    let app = create_test_app(pool);

    upload_request(&app, "file", Some("low.csv"), VALID_CSV).await;
    let high_csv = "Date;Execution Time;Value\n2024-03-01T08-30-00.0000Z;50.0;90.0\n";
    upload_request(&app, "file", Some("high.csv"), high_csv).await;

    let (status, body) =
        get_request(&app, "/api/v1/measurements/summaries?min_avg_value=10").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["meta"]["count"], 1);
    assert_eq!(json["data"][0]["file_name"], "high.csv");

    Ok(())
}

// ============================================================================
// Routing Tests
// ============================================================================

#[tokio::test]
async fn test_unknown_route() {
    let app = create_offline_app();

    let (status, _body) = get_request(&app, "/api/v1/measurements/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
