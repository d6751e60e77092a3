#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use ferrous_feed_application::ports::{FeedPublisherPort, FetchOutcome, SourceFetcher};
use ferrous_feed_application::services::{
    AggregationEngine, SourceStatus, StatusBoard,
};
use ferrous_feed_application::use_cases::{RunAggregationCycleUseCase, SourceUpdate};
use ferrous_feed_domain::{
    normalize_domain, AllowList, CacheValidators, CanonicalSet, DomainEntry, EntryScope,
    FeedGeneration, FetchError, Source, SourceFormat,
};
use ferrous_feed_jobs::SourceReport;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Mock SourceFetcher
// ============================================================================

pub struct MockSourceFetcher {
    outcomes: Mutex<VecDeque<FetchOutcome>>,
    call_count: AtomicUsize,
    delay: Duration,
}

impl MockSourceFetcher {
    pub fn new(outcomes: Vec<FetchOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            call_count: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    /// Every fetch blocks for `delay` before answering.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new(vec![])
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFetcher for MockSourceFetcher {
    async fn fetch(&self, _source: &Source) -> FetchOutcome {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(FetchOutcome::Unchanged)
    }
}

pub fn updated(body: &str) -> FetchOutcome {
    FetchOutcome::Updated {
        body: body.to_string(),
        validators: CacheValidators {
            etag: Some("\"v1\"".to_string()),
            last_modified: None,
        },
    }
}

// ============================================================================
// Mock FeedPublisherPort
// ============================================================================

pub struct MockFeedPublisher {
    current: Mutex<Option<Arc<FeedGeneration>>>,
    next_generation: AtomicU64,
}

impl MockFeedPublisher {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
            next_generation: AtomicU64::new(1),
        }
    }

    pub fn generation(&self) -> Option<u64> {
        self.current().map(|g| g.generation)
    }

    pub fn lines(&self) -> Vec<String> {
        self.current()
            .map(|g| {
                String::from_utf8(g.body.to_vec())
                    .unwrap()
                    .lines()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl FeedPublisherPort for MockFeedPublisher {
    fn publish(&self, set: &CanonicalSet) -> Arc<FeedGeneration> {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let text: String = set
            .entries()
            .map(|e| format!("{}\n", e.domain))
            .collect();
        let body = Bytes::from(text);
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
        *self.current.lock().unwrap() = Some(Arc::clone(&feed));
        feed
    }

    fn current(&self) -> Option<Arc<FeedGeneration>> {
        self.current.lock().unwrap().clone()
    }

    fn restore(&self, generation: FeedGeneration) -> Arc<FeedGeneration> {
        let feed = Arc::new(generation);
        *self.current.lock().unwrap() = Some(Arc::clone(&feed));
        feed
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn make_source(name: &str, degrade_gracefully: bool) -> Source {
    Source::new(
        name,
        format!("https://lists.example/{name}.txt"),
        SourceFormat::Domains,
        Duration::from_secs(3600),
        degrade_gracefully,
    )
}

pub fn make_cycle(publisher: Arc<MockFeedPublisher>) -> Arc<RunAggregationCycleUseCase> {
    Arc::new(RunAggregationCycleUseCase::new(
        AggregationEngine::default(),
        Arc::new(AllowList::default()),
        publisher,
    ))
}

pub fn make_board(sources: &[Source]) -> Arc<StatusBoard> {
    Arc::new(StatusBoard::new(
        sources.iter().map(SourceStatus::from_source).collect(),
    ))
}

pub fn fresh_report(index: usize, source: &Source, domains: &[&str]) -> SourceReport {
    let entries: Vec<DomainEntry> = domains
        .iter()
        .map(|d| {
            DomainEntry::new(
                normalize_domain(d).unwrap(),
                Arc::clone(&source.name),
                EntryScope::Exact,
            )
        })
        .collect();
    SourceReport {
        index,
        update: SourceUpdate::Fresh(entries.into()),
    }
}

pub fn failed_report(index: usize) -> SourceReport {
    SourceReport {
        index,
        update: SourceUpdate::Failed(FetchError::Status(503)),
    }
}

pub fn unchanged_report(index: usize) -> SourceReport {
    SourceReport {
        index,
        update: SourceUpdate::Unchanged,
    }
}

/// Poll until `check` holds or two seconds pass.
pub async fn wait_for(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
