use async_trait::async_trait;
use ferrous_feed_domain::{CacheValidators, FetchError, Source};

/// Result of one (possibly retried) conditional fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The upstream confirmed the cached copy is current (HTTP 304).
    Unchanged,
    Updated {
        body: String,
        validators: CacheValidators,
    },
    Failed(FetchError),
}

/// Application-layer port for retrieving one upstream list.
///
/// Implementations send the source's cache validators, apply the timeout,
/// retry and body-size policy, and never panic on upstream misbehaviour.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, source: &Source) -> FetchOutcome;
}
