//! Error types for TDP

use thiserror::Error;

/// Result type alias for TDP operations
pub type Result<T> = std::result::Result<T, TdpError>;

/// Errors produced by the shared measurement-file utilities
#[derive(Error, Debug)]
pub enum TdpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}
