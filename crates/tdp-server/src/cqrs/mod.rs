//! CQRS wiring
//!
//! Every operation is a command or query struct with a `handle` function in
//! its feature slice. [`build_mediator`] registers all of them against one
//! connection pool; the HTTP routes call the handle functions directly, so
//! the mediator is the seam for embedders and background callers.

pub use mediator::DefaultAsyncMediator;
use sqlx::PgPool;

pub mod middleware;

pub type AppMediator = DefaultAsyncMediator;

/// Builds the mediator with every measurement operation registered.
pub fn build_mediator(pool: PgPool) -> AppMediator {
    DefaultAsyncMediator::builder()
        // Measurements
        .add_handler({
            let pool = pool.clone();
            move |cmd| {
                let pool = pool.clone();
                async move { crate::features::measurements::commands::ingest::handle(pool, cmd).await }
            }
        })
        .add_handler({
            let pool = pool.clone();
            move |query| {
                let pool = pool.clone();
                async move {
                    crate::features::measurements::queries::recent_measurements::handle(pool, query)
                        .await
                }
            }
        })
        .add_handler({
            let pool = pool.clone();
            move |query| {
                let pool = pool.clone();
                async move {
                    crate::features::measurements::queries::filter_summaries::handle(pool, query)
                        .await
                }
            }
        })
        .build()
}
