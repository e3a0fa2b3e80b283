//! Feature slices implementing the TDP API
//!
//! Each feature is a vertical slice in the CQRS (Command Query
//! Responsibility Segregation) style: `commands/` hold the write
//! operations, `queries/` the reads, and `routes.rs` the HTTP surface.
//! Slices talk to the database through their own handlers and share only
//! the code in [`shared`].
//!
//! # Features
//!
//! - **measurements**: measurement file ingest, recent-row reads, and
//!   per-file summary filtering

pub mod measurements;
pub mod shared;

use axum::Router;
use sqlx::PgPool;

/// Mount every feature under its path prefix
///
/// The caller nests the result under the API version prefix; each slice
/// receives the connection pool as router state.
pub fn router(pool: PgPool) -> Router<()> {
    Router::new().nest("/measurements", measurements::measurements_routes().with_state(pool))
}
