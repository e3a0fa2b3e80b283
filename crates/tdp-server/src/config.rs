//! Configuration management
//!
//! Runtime settings come from environment variables (a `.env` file is read
//! first when present), with documented defaults for local development.
//! Upload limits are deliberately not configurable; they are part of the API
//! contract and live as constants next to the routes.

use serde::{Deserialize, Serialize};

/// Bind host when `TDP_HOST` is unset.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Bind port when `TDP_PORT` is unset.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Grace period in seconds for in-flight requests at shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Connection string used when `DATABASE_URL` is unset.
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/tdp";

/// Pool size ceiling.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Connections the pool keeps warm.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Seconds to wait for a fresh connection before giving up.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Seconds an idle connection survives before the pool closes it.
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default CORS origin list (any origin).
pub const DEFAULT_CORS_ALLOWED_ORIGINS: &str = "*";

/// Full runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
}

/// Listener address and shutdown tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Read an environment variable, falling back to a default.
fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read and parse an environment variable, falling back on absence or a
/// value that does not parse.
fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

/// Split a comma-separated origin list, trimming entries and dropping
/// empty ones.
fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            host: env_string("TDP_HOST", DEFAULT_SERVER_HOST),
            port: env_parsed("TDP_PORT", DEFAULT_SERVER_PORT),
            shutdown_timeout_secs: env_parsed("TDP_SHUTDOWN_TIMEOUT", DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }

    /// The host:port string the listener binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    fn from_env() -> Self {
        Self {
            url: env_string("DATABASE_URL", DEFAULT_DATABASE_URL),
            max_connections: env_parsed("DATABASE_MAX_CONNECTIONS", DEFAULT_DATABASE_MAX_CONNECTIONS),
            min_connections: env_parsed("DATABASE_MIN_CONNECTIONS", DEFAULT_DATABASE_MIN_CONNECTIONS),
            connect_timeout_secs: env_parsed(
                "DATABASE_CONNECT_TIMEOUT",
                DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            ),
            idle_timeout_secs: env_parsed(
                "DATABASE_IDLE_TIMEOUT",
                DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            ),
        }
    }
}

impl CorsConfig {
    fn from_env() -> Self {
        Self {
            allowed_origins: parse_origin_list(&env_string(
                "CORS_ALLOWED_ORIGINS",
                DEFAULT_CORS_ALLOWED_ORIGINS,
            )),
            allow_credentials: env_parsed("CORS_ALLOW_CREDENTIALS", false),
        }
    }
}

impl Config {
    /// Read every section from the environment and validate the result
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig::from_env(),
            database: DatabaseConfig::from_env(),
            cors: CorsConfig::from_env(),
        };

        config.validate()?;

        Ok(config)
    }

    /// Reject configurations the server cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port 0 is not bindable");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("DATABASE_URL must not be empty");
        }

        // sqlx only speaks postgres here
        if !self.database.url.starts_with("postgres://")
            && !self.database.url.starts_with("postgresql://")
        {
            anyhow::bail!("Database URL must use the postgres:// or postgresql:// scheme");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database pool needs at least one connection");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) exceeds max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("CORS origin list is empty, every origin will be accepted");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGINS.to_string()],
                allow_credentials: false,
            },
        }
    }
}
