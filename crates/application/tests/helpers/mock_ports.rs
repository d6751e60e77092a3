#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use ferrous_feed_application::ports::{
    FeedPublisherPort, FeedSnapshotStore, FetchOutcome, SourceFetcher,
};
use ferrous_feed_domain::{
    CacheValidators, CanonicalSet, DomainError, FeedGeneration, Source, SourceFormat,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Mock SourceFetcher
// ============================================================================

/// Returns scripted outcomes in order; repeats the last one when exhausted.
pub struct MockSourceFetcher {
    outcomes: Mutex<VecDeque<FetchOutcome>>,
    last: Mutex<Option<FetchOutcome>>,
    seen_validators: Mutex<Vec<CacheValidators>>,
    call_count: AtomicUsize,
}

impl MockSourceFetcher {
    pub fn new(outcomes: Vec<FetchOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            last: Mutex::new(None),
            seen_validators: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn seen_validators(&self) -> Vec<CacheValidators> {
        self.seen_validators.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceFetcher for MockSourceFetcher {
    async fn fetch(&self, source: &Source) -> FetchOutcome {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.seen_validators
            .lock()
            .unwrap()
            .push(source.cache.clone());

        let next = self.outcomes.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(outcome) => {
                *last = Some(outcome.clone());
                outcome
            }
            None => last.clone().unwrap_or(FetchOutcome::Unchanged),
        }
    }
}

pub fn updated(body: &str, etag: &str) -> FetchOutcome {
    FetchOutcome::Updated {
        body: body.to_string(),
        validators: CacheValidators {
            etag: Some(etag.to_string()),
            last_modified: None,
        },
    }
}

pub fn make_source(name: &str, format: SourceFormat) -> Source {
    Source::new(
        name,
        format!("https://lists.example/{name}.txt"),
        format,
        Duration::from_secs(3600),
        true,
    )
}

// ============================================================================
// Mock FeedPublisherPort
// ============================================================================

/// Renders one domain per line; no partitioning.
pub struct MockFeedPublisher {
    current: Mutex<Option<Arc<FeedGeneration>>>,
    next_generation: AtomicU64,
    publish_count: AtomicUsize,
}

impl MockFeedPublisher {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
            next_generation: AtomicU64::new(1),
            publish_count: AtomicUsize::new(0),
        }
    }

    pub fn publish_count(&self) -> usize {
        self.publish_count.load(Ordering::Relaxed)
    }

    pub fn current_text(&self) -> Option<String> {
        self.current()
            .map(|g| String::from_utf8(g.body.to_vec()).unwrap())
    }
}

impl FeedPublisherPort for MockFeedPublisher {
    fn publish(&self, set: &CanonicalSet) -> Arc<FeedGeneration> {
        self.publish_count.fetch_add(1, Ordering::Relaxed);

        let mut text = String::new();
        for entry in set.entries() {
            text.push_str(entry.domain.as_str());
            text.push('\n');
        }
        let body = Bytes::from(text);

        let mut current = self.current.lock().unwrap();
        if let Some(existing) = current.as_ref() {
            if existing.body == body {
                return Arc::clone(existing);
            }
        }

        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let feed = Arc::new(FeedGeneration {
            generation,
            built_at: Utc::now(),
            etag: FeedGeneration::compute_etag(generation, &body),
            parts: vec![body.clone()],
            body,
            domain_count: set.len(),
            dropped_entries: 0,
            base_level: 0,
            levels: Vec::new(),
        });
        *current = Some(Arc::clone(&feed));
        feed
    }

    fn current(&self) -> Option<Arc<FeedGeneration>> {
        self.current.lock().unwrap().clone()
    }

    fn restore(&self, generation: FeedGeneration) -> Arc<FeedGeneration> {
        self.next_generation
            .fetch_max(generation.generation + 1, Ordering::SeqCst);
        let feed = Arc::new(generation);
        *self.current.lock().unwrap() = Some(Arc::clone(&feed));
        feed
    }
}

// ============================================================================
// Mock FeedSnapshotStore
// ============================================================================

pub struct MockSnapshotStore {
    saved: Mutex<Vec<u64>>,
    stored: Mutex<Option<FeedGeneration>>,
    should_fail: bool,
}

impl MockSnapshotStore {
    pub fn new() -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
            stored: Mutex::new(None),
            should_fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new()
        }
    }

    pub fn with_stored(generation: FeedGeneration) -> Self {
        Self {
            stored: Mutex::new(Some(generation)),
            ..Self::new()
        }
    }

    pub fn saved_generations(&self) -> Vec<u64> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedSnapshotStore for MockSnapshotStore {
    async fn save(&self, generation: &FeedGeneration) -> Result<(), DomainError> {
        if self.should_fail {
            return Err(DomainError::IoError("disk full".to_string()));
        }
        self.saved.lock().unwrap().push(generation.generation);
        Ok(())
    }

    async fn load(&self) -> Result<Option<FeedGeneration>, DomainError> {
        Ok(self.stored.lock().unwrap().clone())
    }
}
