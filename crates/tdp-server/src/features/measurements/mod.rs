pub mod aggregate;
pub mod commands;
pub mod parser;
pub mod queries;
pub mod routes;

pub use commands::{
    IngestMeasurementsCommand, IngestMeasurementsError, IngestMeasurementsResponse,
};

pub use queries::{
    FilterSummariesError, FilterSummariesQuery, FilterSummariesResponse, MeasurementItem,
    RecentMeasurementsError, RecentMeasurementsQuery, RecentMeasurementsResponse, SummaryItem,
};

pub use routes::measurements_routes;
