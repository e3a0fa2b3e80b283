pub mod filter_summaries;
pub mod recent_measurements;

pub use filter_summaries::{
    FilterSummariesError, FilterSummariesQuery, FilterSummariesResponse, SummaryItem,
};
pub use recent_measurements::{
    MeasurementItem, RecentMeasurementsError, RecentMeasurementsQuery, RecentMeasurementsResponse,
};
