use crate::ports::{FeedPublisherPort, FeedSnapshotStore};
use crate::services::{AggregationEngine, AggregationOutcome, SourceContribution};
use ferrous_feed_domain::{AllowList, CanonicalSet, DomainError, FeedGeneration};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Use case: merge the latest contributions and publish the result.
///
/// Split in two steps so the caller can abandon a cycle between building
/// the canonical set and publishing it (shutdown).
pub struct RunAggregationCycleUseCase {
    engine: AggregationEngine,
    allow: Arc<AllowList>,
    publisher: Arc<dyn FeedPublisherPort>,
    snapshot: Option<Arc<dyn FeedSnapshotStore>>,
}

impl RunAggregationCycleUseCase {
    pub fn new(
        engine: AggregationEngine,
        allow: Arc<AllowList>,
        publisher: Arc<dyn FeedPublisherPort>,
    ) -> Self {
        Self {
            engine,
            allow,
            publisher,
            snapshot: None,
        }
    }

    pub fn with_snapshot(mut self, store: Arc<dyn FeedSnapshotStore>) -> Self {
        self.snapshot = Some(store);
        self
    }

    pub fn aggregate(
        &self,
        contributions: &[SourceContribution],
        previous: Option<&CanonicalSet>,
    ) -> Result<AggregationOutcome, DomainError> {
        match self.engine.aggregate(contributions, &self.allow, previous) {
            Ok(outcome) => {
                info!(
                    domains = outcome.set.len(),
                    fresh_sources = outcome.stats.fresh_sources,
                    retained_sources = outcome.stats.retained_sources,
                    dropped_sources = outcome.stats.dropped_sources,
                    duplicates = outcome.stats.duplicates,
                    allow_removed = outcome.stats.allow_removed,
                    "Aggregation cycle built"
                );
                Ok(outcome)
            }
            Err(DomainError::TotalBlackout) => {
                let current = self.publisher.current().map(|g| g.generation);
                warn!(
                    sources = contributions.len(),
                    kept_generation = ?current,
                    "Total blackout: no source produced entries; keeping current feed"
                );
                Err(DomainError::TotalBlackout)
            }
            Err(e) => Err(e),
        }
    }

    /// Publish `set` as the new current generation and persist it if a
    /// snapshot store is configured. Snapshot failures are logged only.
    ///
    /// When the rendered feed matches the current generation byte for byte,
    /// the publisher keeps the current generation and nothing is written.
    pub async fn publish(&self, set: &CanonicalSet) -> Arc<FeedGeneration> {
        let before = self.publisher.current().map(|g| g.generation);
        let generation = self.publisher.publish(set);

        if before == Some(generation.generation) {
            info!(
                generation = generation.generation,
                domains = generation.domain_count,
                "Feed content unchanged; keeping current generation"
            );
            return generation;
        }

        if generation.dropped_entries > 0 {
            warn!(
                generation = generation.generation,
                dropped = generation.dropped_entries,
                "Entries dropped while rendering feed"
            );
        }
        info!(
            generation = generation.generation,
            domains = generation.domain_count,
            parts = generation.part_count(),
            levels = ?generation.level_numbers(),
            bytes = generation.body.len(),
            "Feed generation published"
        );

        if let Some(store) = &self.snapshot {
            if let Err(e) = store.save(&generation).await {
                error!(error = %e, generation = generation.generation, "Failed to write feed snapshot");
            }
        }

        generation
    }
}
