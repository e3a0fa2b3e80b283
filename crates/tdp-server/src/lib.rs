//! TDP Server Library
//!
//! HTTP server for ingesting and summarizing measurement files.
//!
//! # Overview
//!
//! The server exposes a versioned REST API over PostgreSQL-backed
//! measurement storage:
//!
//! - **API Endpoints**: multipart upload plus JSON read endpoints under `/api/v1`
//! - **Storage**: per-file measurement rows and precomputed summaries
//! - **Configuration**: every tunable is read from environment variables
//! - **Middleware**: CORS, request tracing, and response compression
//!
//! # Architecture
//!
//! Write and read paths are kept apart in the CQRS style:
//!
//! - **Commands** mutate state and arrive over HTTP POST. Ingesting a file
//!   replaces its rows and its stored summary inside one transaction.
//! - **Queries** read state and arrive over HTTP GET. They cover the recent
//!   rows of a file and per-file summaries with optional value filters.
//!
//! Each operation lives in a vertical slice under [`features`]; the
//! [`cqrs`] module wires the same handlers into a mediator for callers
//! outside the HTTP layer.
//!
//! ## Framework Stack
//!
//! - **Axum** handles routing, extraction, and responses
//! - **SQLx** provides the async PostgreSQL pool
//! - **Tower** supplies the middleware layers
//!
//! # Example
//!
//! ```no_run
//! use tdp_server::{api, config::Config, db};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     api::serve(config, pool).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod cqrs;
pub mod db;
pub mod features;
pub mod middleware;
