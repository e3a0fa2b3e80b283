pub mod ingest;

pub use ingest::{IngestMeasurementsCommand, IngestMeasurementsError, IngestMeasurementsResponse};
