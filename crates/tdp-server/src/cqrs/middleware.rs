//! Marker traits for the CQRS pipeline
//!
//! Commands are write operations, queries are read operations. The markers
//! keep the two sides visibly separate at the type level.

/// Marker for write operations dispatched through the mediator.
pub trait Command {}

/// Marker for read operations dispatched through the mediator.
pub trait Query {}
