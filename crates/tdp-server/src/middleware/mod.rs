//! HTTP middleware layers
//!
//! The measurement API is a small surface: one multipart upload endpoint and
//! two read endpoints. The CORS layer therefore only advertises the methods
//! and headers that surface actually uses, with origins taken from
//! [`CorsConfig`].

use axum::http::{header, Method};
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::CorsConfig;

/// How long browsers may cache a preflight response.
const CORS_MAX_AGE_SECS: u64 = 3600;

/// Create CORS layer from configuration
///
/// Uploads arrive as `POST` multipart bodies and reads as `GET`, so only
/// those methods (plus preflight `OPTIONS`) are allowed. An empty origin
/// list or a `*` entry opens the API to any origin.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(CORS_MAX_AGE_SECS));

    let any_origin =
        config.allowed_origins.is_empty() || config.allowed_origins.iter().any(|o| o == "*");

    if any_origin {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<_> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    // Credentials cannot be combined with a wildcard origin
    if config.allow_credentials && !any_origin {
        cors = cors.allow_credentials(true);
    }

    cors
}

/// Create tracing/logging layer
///
/// Spans and completions log at INFO with microsecond latencies; request
/// starts log at DEBUG, which makes long multipart uploads visible before
/// they finish.
pub fn tracing_layer(
) -> TraceLayer<tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>>
{
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(tower_http::LatencyUnit::Micros),
        )
}
