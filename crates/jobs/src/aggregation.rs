use crate::source_refresh::SourceReport;
use ferrous_feed_application::services::{ContributionState, SourceContribution, StatusBoard};
use ferrous_feed_application::use_cases::{RunAggregationCycleUseCase, SourceUpdate};
use ferrous_feed_domain::{CanonicalSet, DomainEntry, DomainError, Source};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

struct Slot {
    contribution: SourceContribution,
    /// Entries of the last successful parse; a later 304 re-uses them.
    last_good: Option<Arc<[DomainEntry]>>,
    reported: bool,
}

impl Slot {
    fn apply(&mut self, update: SourceUpdate) {
        self.reported = true;
        self.contribution.state = match update {
            SourceUpdate::Fresh(entries) => {
                self.last_good = Some(Arc::clone(&entries));
                ContributionState::Fresh(entries)
            }
            SourceUpdate::Unchanged => match &self.last_good {
                Some(entries) => ContributionState::Fresh(Arc::clone(entries)),
                None => ContributionState::Pending,
            },
            SourceUpdate::Failed(_) => ContributionState::Failed {
                cycles_failed: match self.contribution.state {
                    ContributionState::Failed { cycles_failed, .. } => cycles_failed,
                    _ => 0,
                },
                last_good: self.last_good.clone(),
            },
        };
    }
}

/// Single task that owns every source's latest contribution and the previous
/// canonical set, and turns batches of source reports into feed generations.
pub struct AggregationJob {
    cycle: Arc<RunAggregationCycleUseCase>,
    board: Arc<StatusBoard>,
    reports: mpsc::Receiver<SourceReport>,
    slots: Vec<Slot>,
    previous: Option<CanonicalSet>,
    batch_window: Duration,
    startup_grace: Duration,
    shutdown: CancellationToken,
}

impl AggregationJob {
    /// `sources` must be in configuration order, matching report indices.
    pub fn new(
        cycle: Arc<RunAggregationCycleUseCase>,
        board: Arc<StatusBoard>,
        reports: mpsc::Receiver<SourceReport>,
        sources: &[Source],
    ) -> Self {
        let slots = sources
            .iter()
            .map(|s| Slot {
                contribution: SourceContribution {
                    name: Arc::clone(&s.name),
                    degrade_gracefully: s.degrade_gracefully,
                    security_level: s.security_level,
                    state: ContributionState::Pending,
                },
                last_good: None,
                reported: false,
            })
            .collect();

        Self {
            cycle,
            board,
            reports,
            slots,
            previous: None,
            batch_window: Duration::from_secs(2),
            startup_grace: Duration::from_secs(120),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_batch_window(mut self, window: Duration) -> Self {
        self.batch_window = window;
        self
    }

    pub fn with_startup_grace(mut self, grace: Duration) -> Self {
        self.startup_grace = grace;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn start(self) -> JoinHandle<()> {
        info!(
            sources = self.slots.len(),
            batch_window_ms = self.batch_window.as_millis() as u64,
            startup_grace_secs = self.startup_grace.as_secs(),
            "Starting aggregation job"
        );
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        if !self.initial_round().await {
            info!("Aggregation job stopped before first cycle");
            return;
        }
        self.run_cycle().await;

        loop {
            let first = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                report = self.reports.recv() => match report {
                    Some(report) => report,
                    None => break,
                },
            };
            self.apply(first);

            let window = tokio::time::sleep(self.batch_window);
            tokio::pin!(window);
            let mut closed = false;
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("Aggregation job stopped");
                        return;
                    }
                    _ = &mut window => break,
                    report = self.reports.recv() => match report {
                        Some(report) => self.apply(report),
                        None => {
                            closed = true;
                            break;
                        }
                    },
                }
            }

            self.run_cycle().await;
            if closed {
                break;
            }
        }

        info!("Aggregation job stopped");
    }

    /// Wait until every source reported once or the grace period ran out.
    /// Returns `false` on shutdown.
    async fn initial_round(&mut self) -> bool {
        let deadline = Instant::now() + self.startup_grace;

        while self.slots.iter().any(|s| !s.reported) {
            tokio::select! {
                _ = self.shutdown.cancelled() => return false,
                _ = tokio::time::sleep_until(deadline) => {
                    let pending: Vec<&str> = self
                        .slots
                        .iter()
                        .filter(|s| !s.reported)
                        .map(|s| &*s.contribution.name)
                        .collect();
                    warn!(?pending, "Startup grace elapsed before all sources reported");
                    break;
                }
                report = self.reports.recv() => match report {
                    Some(report) => self.apply(report),
                    None => break,
                },
            }
        }
        true
    }

    fn apply(&mut self, report: SourceReport) {
        let Some(slot) = self.slots.get_mut(report.index) else {
            warn!(index = report.index, "Report for unknown source index");
            return;
        };
        slot.apply(report.update);
    }

    async fn run_cycle(&mut self) {
        let contributions: Vec<SourceContribution> =
            self.slots.iter().map(|s| s.contribution.clone()).collect();

        match self.cycle.aggregate(&contributions, self.previous.as_ref()) {
            Ok(outcome) => {
                if self.shutdown.is_cancelled() {
                    info!("Shutdown requested; abandoning aggregation before publish");
                    return;
                }
                self.cycle.publish(&outcome.set).await;
                self.board.record_cycle(outcome.set.len());
                self.previous = Some(outcome.set);
            }
            Err(DomainError::TotalBlackout) => self.board.record_blackout(),
            Err(e) => error!(error = %e, "Aggregation cycle failed"),
        }

        for slot in &mut self.slots {
            if let ContributionState::Failed { cycles_failed, .. } = &mut slot.contribution.state {
                *cycles_failed = cycles_failed.saturating_add(1);
            }
        }
    }
}
