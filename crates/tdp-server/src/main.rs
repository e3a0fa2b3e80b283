//! TDP Server - Main entry point

use anyhow::Result;
use tdp_common::logging::{init_logging, LogConfig};
use tracing::info;

use tdp_server::{api, config::Config, db};

#[tokio::main]
async fn main() -> Result<()> {
    // Service defaults first, environment variables on top
    let log_config = LogConfig::builder()
        .log_file_prefix("tdp-server")
        .filter_directives("tdp_server=debug,tower_http=debug,axum=trace,sqlx=info")
        .build()
        .overlay_env()?;

    init_logging(&log_config)?;

    info!("Starting TDP Server");

    let config = Config::load()?;
    info!(addr = %config.server.bind_addr(), "Configuration loaded");

    let db_pool = db::create_pool(&config.database).await?;

    // Schema first, traffic second
    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
    info!("Database migrations applied");

    api::serve(config, db_pool).await?;

    info!("Server shut down gracefully");

    Ok(())
}
