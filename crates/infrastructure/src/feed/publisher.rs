use super::renderer::FeedRenderer;
use arc_swap::ArcSwapOption;
use chrono::Utc;
use ferrous_feed_application::ports::FeedPublisherPort;
use ferrous_feed_domain::{CanonicalSet, FeedGeneration, LevelFeed};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Holds the current feed generation and swaps in new ones atomically.
///
/// Readers `load` the pointer without locking; a publish renders the whole
/// feed, every security level included, before the single `store`, so nobody
/// ever observes a partial feed. Only the aggregation task publishes.
pub struct FeedPublisher {
    renderer: FeedRenderer,
    current: ArcSwapOption<FeedGeneration>,
    next_generation: AtomicU64,
}

impl FeedPublisher {
    pub fn new(renderer: FeedRenderer) -> Self {
        Self {
            renderer,
            current: ArcSwapOption::const_empty(),
            next_generation: AtomicU64::new(1),
        }
    }
}

impl FeedPublisherPort for FeedPublisher {
    fn publish(&self, set: &CanonicalSet) -> Arc<FeedGeneration> {
        let rendered = self.renderer.render(set);
        let levels: Vec<LevelFeed> = set
            .levels()
            .iter()
            .map(|tier| {
                let feed = self.renderer.render(&tier.set);
                LevelFeed {
                    level: tier.level,
                    domain_count: tier.set.len() - feed.dropped,
                    dropped_entries: feed.dropped,
                    body: feed.body,
                    parts: feed.parts,
                }
            })
            .collect();

        let mut candidate = FeedGeneration {
            generation: 0,
            built_at: Utc::now(),
            etag: String::new(),
            body: rendered.body,
            parts: rendered.parts,
            domain_count: set.len() - rendered.dropped,
            dropped_entries: rendered.dropped,
            base_level: set.base_level(),
            levels,
        };

        if let Some(current) = self.current.load_full() {
            if current.same_content(&candidate) {
                debug!(generation = current.generation, "Rendered feed identical; no swap");
                return current;
            }
        }

        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        candidate.generation = generation;
        candidate.etag = FeedGeneration::compute_etag(generation, &candidate.body);

        let feed = Arc::new(candidate);
        self.current.store(Some(Arc::clone(&feed)));
        debug!(
            generation,
            lines = rendered.lines,
            levels = feed.levels.len(),
            "Feed generation swapped in"
        );
        feed
    }

    fn current(&self) -> Option<Arc<FeedGeneration>> {
        self.current.load_full()
    }

    fn restore(&self, generation: FeedGeneration) -> Arc<FeedGeneration> {
        self.next_generation
            .fetch_max(generation.generation + 1, Ordering::SeqCst);
        let feed = Arc::new(generation);
        self.current.store(Some(Arc::clone(&feed)));
        feed
    }
}
