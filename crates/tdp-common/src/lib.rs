//! TDP Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the TDP project.
//!
//! # Overview
//!
//! This crate provides common functionality used across all TDP workspace members:
//!
//! - **Error Handling**: the [`TdpError`] type and its [`Result`] alias
//! - **Logging**: Tracing setup shared by every binary
//! - **Timestamps**: The measurement file timestamp format
//! - **Types**: Shared measurement domain types
//!
//! # Example
//!
//! ```no_run
//! use tdp_common::logging::{init_logging, LogConfig};
//!
//! fn start() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod timestamp;
pub mod types;

// Re-export commonly used types
pub use error::{Result, TdpError};
