use ferrous_feed_api::AppState;
use ferrous_feed_application::ports::{FeedPublisherPort, FeedSnapshotStore, SourceFetcher};
use ferrous_feed_application::services::{AggregationEngine, SourceStatus, StatusBoard};
use ferrous_feed_application::use_cases::{
    GetFeedStatusUseCase, GetFeedUseCase, RefreshSourceUseCase, RestoreFeedSnapshotUseCase,
    RunAggregationCycleUseCase,
};
use ferrous_feed_domain::{AllowList, Config, Source};
use ferrous_feed_infrastructure::blocklist::HttpSourceFetcher;
use ferrous_feed_infrastructure::feed::{FeedPublisher, FeedRenderer, FsFeedSnapshotStore};
use ferrous_feed_jobs::{AggregationJob, JobRunner, RefreshSchedule, SourceRefreshJob};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Everything `main` needs, wired from the validated config.
pub struct Services {
    pub app_state: AppState,
    pub runner: JobRunner,
    restore: Option<RestoreFeedSnapshotUseCase>,
}

impl Services {
    pub fn build(config: &Config, shutdown: CancellationToken) -> anyhow::Result<Self> {
        let sources: Vec<Source> = config.sources.iter().map(Source::from_config).collect();

        let allow = Arc::new(AllowList::parse(&config.feed.allow)?);
        info!(entries = allow.len(), "Allow list loaded");

        let publisher: Arc<dyn FeedPublisherPort> = Arc::new(FeedPublisher::new(
            FeedRenderer::new(config.feed.format, config.feed.max_lines_per_part),
        ));
        let snapshot: Option<Arc<dyn FeedSnapshotStore>> =
            config.feed.snapshot_dir.as_ref().map(|dir| {
                Arc::new(FsFeedSnapshotStore::new(dir, config.feed.part_prefix.as_str()))
                    as Arc<dyn FeedSnapshotStore>
            });

        let board = Arc::new(StatusBoard::new(
            sources.iter().map(SourceStatus::from_source).collect(),
        ));

        let mut cycle = RunAggregationCycleUseCase::new(
            AggregationEngine::new(config.aggregation.scope_conflict),
            allow,
            Arc::clone(&publisher),
        );
        if let Some(store) = &snapshot {
            cycle = cycle.with_snapshot(Arc::clone(store));
        }

        let fetcher: Arc<dyn SourceFetcher> = Arc::new(HttpSourceFetcher::new(&config.limits)?);
        let refresh = Arc::new(RefreshSourceUseCase::new(fetcher));
        let schedule = RefreshSchedule::from_limits(&config.limits);

        let (tx, rx) = mpsc::channel(sources.len().max(1) * 2);
        let aggregation = AggregationJob::new(Arc::new(cycle), Arc::clone(&board), rx, &sources)
            .with_batch_window(config.aggregation.batch_window())
            .with_startup_grace(config.aggregation.startup_grace())
            .with_cancellation(shutdown.clone());

        let source_jobs: Vec<SourceRefreshJob> = sources
            .into_iter()
            .enumerate()
            .map(|(index, source)| {
                SourceRefreshJob::new(index, source, Arc::clone(&refresh), tx.clone())
                    .with_schedule(schedule)
                    .with_status_board(Arc::clone(&board))
                    .with_cancellation(shutdown.clone())
            })
            .collect();

        let runner = JobRunner::new()
            .with_aggregation(aggregation)
            .with_sources(source_jobs);

        let app_state = AppState {
            get_feed: Arc::new(GetFeedUseCase::new(Arc::clone(&publisher))),
            get_status: Arc::new(GetFeedStatusUseCase::new(board, Arc::clone(&publisher))),
        };

        let restore = snapshot.map(|store| RestoreFeedSnapshotUseCase::new(store, publisher));

        Ok(Self {
            app_state,
            runner,
            restore,
        })
    }

    /// Publish the persisted generation, if any, before the first fetch.
    pub async fn restore_snapshot(&self) {
        let Some(restore) = &self.restore else {
            return;
        };
        if let Err(e) = restore.execute().await {
            warn!(error = %e, "Failed to restore feed snapshot; starting cold");
        }
    }
}
