//! HTTP API surface
//!
//! Builds the axum router, serves it, and owns graceful shutdown. Response
//! envelope types live in [`response`]. Everything under `/api/v1` comes
//! from the feature slices; the root and health endpoints live here.

pub mod response;

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::features;
use crate::middleware;

/// State handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
}

/// Serve the API until a shutdown signal arrives
pub async fn serve(config: Config, db: PgPool) -> anyhow::Result<()> {
    let state = AppState { db };
    let app = create_router(state, &config);

    let addr: SocketAddr = config.server.bind_addr().parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    Ok(())
}

/// Assemble the full router: infrastructure endpoints, feature routes,
/// and the middleware stack
pub fn create_router(state: AppState, config: &Config) -> Router {
    // Feature slices own everything under /api/v1
    let feature_routes = features::router(state.db.clone());

    // CORS sits outermost, ahead of tracing and compression
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .with_state(state)
        .nest("/api/v1", feature_routes)
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

/// Service banner
async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "TDP Server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

/// Liveness probe; round-trips the database and reports the latency
async fn health_check(State(state): State<AppState>) -> Result<Response, StatusCode> {
    let started = Instant::now();
    match db::health_check(&state.db).await {
        Ok(()) => {
            let latency_ms = started.elapsed().as_millis() as u64;
            Ok((
                StatusCode::OK,
                Json(json!({
                    "status": "healthy",
                    "database": "connected",
                    "latency_ms": latency_ms
                })),
            )
                .into_response())
        },
        Err(e) => {
            tracing::error!("Health probe could not reach the database: {:?}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        },
    }
}

/// Resolves once SIGINT or SIGTERM arrives, then holds the listener open
/// briefly so in-flight uploads can finish
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Cannot install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Cannot install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!(signal = "SIGINT", "Shutdown signal received");
        },
        _ = terminate => {
            info!(signal = "SIGTERM", "Shutdown signal received");
        },
    }

    info!(timeout_secs, "Draining connections before exit");
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
