use crate::ports::{FeedPublisherPort, FeedSnapshotStore};
use ferrous_feed_domain::DomainError;
use std::sync::Arc;
use tracing::info;

/// Use case: publish the last persisted generation at start-up.
pub struct RestoreFeedSnapshotUseCase {
    store: Arc<dyn FeedSnapshotStore>,
    publisher: Arc<dyn FeedPublisherPort>,
}

impl RestoreFeedSnapshotUseCase {
    pub fn new(store: Arc<dyn FeedSnapshotStore>, publisher: Arc<dyn FeedPublisherPort>) -> Self {
        Self { store, publisher }
    }

    /// Returns the restored generation number, or `None` without a snapshot.
    pub async fn execute(&self) -> Result<Option<u64>, DomainError> {
        let Some(generation) = self.store.load().await? else {
            info!("No feed snapshot found; starting cold");
            return Ok(None);
        };

        let restored = self.publisher.restore(generation);
        info!(
            generation = restored.generation,
            domains = restored.domain_count,
            built_at = %restored.built_at,
            "Feed restored from snapshot"
        );
        Ok(Some(restored.generation))
    }
}
