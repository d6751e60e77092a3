pub mod aggregation;
pub mod runner;
pub mod source_refresh;

pub use aggregation::AggregationJob;
pub use runner::JobRunner;
pub use source_refresh::{failure_backoff, jitter, RefreshSchedule, SourceRefreshJob, SourceReport};
