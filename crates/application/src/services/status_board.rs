use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use ferrous_feed_domain::{FetchStatus, Source, SourcePhase, SourceStats};
use serde::Serialize;
use std::sync::Arc;

/// Diagnostic view of one source, copied out of its owning task.
#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    pub name: Arc<str>,
    pub url: Arc<str>,
    pub format: &'static str,
    pub phase: SourcePhase,
    pub last_outcome: Option<FetchStatus>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub degrade_gracefully: bool,
    pub security_level: u32,
    pub stats: SourceStats,
}

impl SourceStatus {
    pub fn from_source(source: &Source) -> Self {
        Self {
            name: Arc::clone(&source.name),
            url: Arc::clone(&source.url),
            format: source.format.as_str(),
            phase: source.phase,
            last_outcome: source.last_outcome.clone(),
            last_attempt_at: source.last_attempt_at,
            last_success_at: source.last_success_at,
            consecutive_failures: source.consecutive_failures,
            degrade_gracefully: source.degrade_gracefully,
            security_level: source.security_level,
            stats: source.stats.clone(),
        }
    }
}

/// Last aggregation summary for diagnostics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleSummary {
    pub cycles: u64,
    pub blackouts: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_blackout_at: Option<DateTime<Utc>>,
    pub last_domain_count: usize,
}

/// Lock-free board the aggregation task writes and the API reads.
///
/// Each update replaces the whole vector; readers never block the writer.
pub struct StatusBoard {
    sources: ArcSwap<Vec<SourceStatus>>,
    cycle: ArcSwap<CycleSummary>,
}

impl StatusBoard {
    pub fn new(initial: Vec<SourceStatus>) -> Self {
        Self {
            sources: ArcSwap::from_pointee(initial),
            cycle: ArcSwap::from_pointee(CycleSummary::default()),
        }
    }

    pub fn sources(&self) -> Arc<Vec<SourceStatus>> {
        self.sources.load_full()
    }

    pub fn cycle(&self) -> Arc<CycleSummary> {
        self.cycle.load_full()
    }

    /// Replace the status at `index`; out-of-range indices are ignored.
    pub fn update_source(&self, index: usize, status: SourceStatus) {
        self.sources.rcu(|current| {
            let mut next = Vec::clone(current);
            if let Some(slot) = next.get_mut(index) {
                *slot = status.clone();
            }
            next
        });
    }

    pub fn record_cycle(&self, domain_count: usize) {
        self.cycle.rcu(|current| {
            let mut next = CycleSummary::clone(current);
            next.cycles += 1;
            next.last_cycle_at = Some(Utc::now());
            next.last_domain_count = domain_count;
            next
        });
    }

    pub fn record_blackout(&self) {
        self.cycle.rcu(|current| {
            let mut next = CycleSummary::clone(current);
            next.blackouts += 1;
            next.last_blackout_at = Some(Utc::now());
            next
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrous_feed_domain::SourceFormat;
    use std::time::Duration;

    fn status(name: &str) -> SourceStatus {
        SourceStatus::from_source(&Source::new(
            name,
            "https://lists.example/x",
            SourceFormat::Domains,
            Duration::from_secs(60),
            true,
        ))
    }

    #[test]
    fn test_update_source_replaces_slot() {
        let board = StatusBoard::new(vec![status("a"), status("b")]);
        let mut updated = status("b");
        updated.consecutive_failures = 3;
        board.update_source(1, updated);

        let sources = board.sources();
        assert_eq!(sources[1].consecutive_failures, 3);
        assert_eq!(sources[0].consecutive_failures, 0);
    }

    #[test]
    fn test_update_out_of_range_ignored() {
        let board = StatusBoard::new(vec![status("a")]);
        board.update_source(5, status("x"));
        assert_eq!(board.sources().len(), 1);
    }

    #[test]
    fn test_cycle_counters() {
        let board = StatusBoard::new(vec![]);
        board.record_cycle(10);
        board.record_blackout();
        board.record_cycle(12);

        let cycle = board.cycle();
        assert_eq!(cycle.cycles, 2);
        assert_eq!(cycle.blackouts, 1);
        assert_eq!(cycle.last_domain_count, 12);
    }
}
