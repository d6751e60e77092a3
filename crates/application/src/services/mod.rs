pub mod aggregation_engine;
pub mod status_board;

pub use aggregation_engine::{
    AggregationEngine, AggregationOutcome, AggregationStats, ContributionState,
    SourceContribution,
};
pub use status_board::{CycleSummary, SourceStatus, StatusBoard};
