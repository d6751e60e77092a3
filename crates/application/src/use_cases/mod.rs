pub mod get_feed;
pub mod get_status;
pub mod refresh_source;
pub mod restore_snapshot;
pub mod run_aggregation_cycle;

pub use get_feed::GetFeedUseCase;
pub use get_status::{FeedStatus, GenerationInfo, GetFeedStatusUseCase, LevelInfo};
pub use refresh_source::{RefreshSourceUseCase, SourceUpdate};
pub use restore_snapshot::RestoreFeedSnapshotUseCase;
pub use run_aggregation_cycle::RunAggregationCycleUseCase;
