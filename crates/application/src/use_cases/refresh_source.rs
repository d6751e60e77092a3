use crate::ports::{FetchOutcome, SourceFetcher};
use ferrous_feed_domain::{parse_list, DomainEntry, FetchError, Source};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a completed fetch means for the next aggregation.
#[derive(Debug, Clone)]
pub enum SourceUpdate {
    /// Freshly parsed and normalized entries.
    Fresh(Arc<[DomainEntry]>),
    /// Upstream confirmed the previous body; reuse the previous entries.
    Unchanged,
    Failed(FetchError),
}

/// Use case: fetch one source, then parse and normalize its body.
///
/// Mutates only the `Source` handed in, which is owned by the calling task.
pub struct RefreshSourceUseCase {
    fetcher: Arc<dyn SourceFetcher>,
}

impl RefreshSourceUseCase {
    pub fn new(fetcher: Arc<dyn SourceFetcher>) -> Self {
        Self { fetcher }
    }

    pub async fn execute(&self, source: &mut Source) -> SourceUpdate {
        source.record_attempt();
        debug!(source = %source.name, url = %source.url, "Fetching source");

        match self.fetcher.fetch(source).await {
            FetchOutcome::Unchanged => {
                source.record_not_modified();
                info!(source = %source.name, "Source not modified; reusing previous entries");
                SourceUpdate::Unchanged
            }
            FetchOutcome::Updated { body, validators } => {
                let report = parse_list(&body, source.format);
                let parse_errors = report.errors;
                for e in &report.sample_errors {
                    debug!(source = %source.name, error = %e, "Skipped malformed line");
                }

                let batch = report.normalize(&source.name);
                for e in &batch.sample_errors {
                    debug!(source = %source.name, error = %e, "Dropped invalid domain");
                }

                source.record_updated(validators);
                source.stats.last_entries = batch.entries.len();
                source.stats.last_parse_errors = parse_errors + batch.invalid;
                source.stats.last_invalid_domains = batch.invalid;

                if parse_errors + batch.invalid > 0 {
                    warn!(
                        source = %source.name,
                        parse_errors,
                        invalid_domains = batch.invalid,
                        "Source contained lines that were skipped"
                    );
                }
                info!(
                    source = %source.name,
                    entries = batch.entries.len(),
                    bytes = body.len(),
                    "Source refreshed"
                );

                SourceUpdate::Fresh(batch.entries.into())
            }
            FetchOutcome::Failed(error) => {
                source.record_failure(&error);
                warn!(
                    source = %source.name,
                    error = %error,
                    consecutive_failures = source.consecutive_failures,
                    "Source fetch failed"
                );
                SourceUpdate::Failed(error)
            }
        }
    }
}
