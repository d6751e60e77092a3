use async_trait::async_trait;
use ferrous_feed_domain::{CanonicalSet, DomainError, FeedGeneration};
use std::sync::Arc;

/// Holds the single current feed generation readers are served.
///
/// `current` never blocks on an in-progress `publish`: a reader sees either
/// the previous generation or the new one, each complete.
pub trait FeedPublisherPort: Send + Sync {
    /// Render `set` into a new generation and make it current. If the
    /// rendered bytes equal the current generation's, the current generation
    /// is returned unchanged so its ETag and Last-Modified stay valid.
    fn publish(&self, set: &CanonicalSet) -> Arc<FeedGeneration>;

    fn current(&self) -> Option<Arc<FeedGeneration>>;

    /// Make a previously persisted generation current (cold start).
    fn restore(&self, generation: FeedGeneration) -> Arc<FeedGeneration>;
}

/// Optional persistence of the last good generation.
#[async_trait]
pub trait FeedSnapshotStore: Send + Sync {
    async fn save(&self, generation: &FeedGeneration) -> Result<(), DomainError>;

    async fn load(&self) -> Result<Option<FeedGeneration>, DomainError>;
}
