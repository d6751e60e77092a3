use crate::{AggregationJob, SourceRefreshJob};
use tokio::task::JoinHandle;
use tracing::info;

/// Central orchestrator for all background jobs.
///
/// Register jobs with the builder methods, then call `.start()` once.
///
/// # Example
///
/// ```rust,ignore
/// let handles = JobRunner::new()
///     .with_source(SourceRefreshJob::new(0, source, refresh, tx))
///     .with_aggregation(AggregationJob::new(cycle, board, rx, &sources))
///     .start()
///     .await;
/// ```
pub struct JobRunner {
    sources: Vec<SourceRefreshJob>,
    aggregation: Option<AggregationJob>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            aggregation: None,
        }
    }

    pub fn with_source(mut self, job: SourceRefreshJob) -> Self {
        self.sources.push(job);
        self
    }

    pub fn with_sources(mut self, jobs: impl IntoIterator<Item = SourceRefreshJob>) -> Self {
        self.sources.extend(jobs);
        self
    }

    pub fn with_aggregation(mut self, job: AggregationJob) -> Self {
        self.aggregation = Some(job);
        self
    }

    /// Start all registered jobs. The aggregation job is spawned first so no
    /// report waits on an absent receiver.
    pub async fn start(self) -> Vec<JoinHandle<()>> {
        info!(sources = self.sources.len(), "Starting background job runner");

        let mut handles = Vec::with_capacity(self.sources.len() + 1);
        if let Some(job) = self.aggregation {
            handles.push(job.start());
        }
        for job in self.sources {
            handles.push(job.start());
        }

        info!("All background jobs started");
        handles
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}
