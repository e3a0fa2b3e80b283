//! Code shared between feature slices
//!
//! # Contents
//!
//! - **validation**: file-name and measurement-content rules applied at
//!   command boundaries

pub mod validation;

// Re-export commonly used types
pub use validation::{
    validate_file_name, validate_measurement, FileNameValidationError, MeasurementValidationError,
};
