use ferrous_feed_application::services::{SourceStatus, StatusBoard};
use ferrous_feed_application::use_cases::{RefreshSourceUseCase, SourceUpdate};
use ferrous_feed_domain::config::LimitsConfig;
use ferrous_feed_domain::{Source, SourcePhase};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// One completed fetch, sent from a source task to the aggregation task.
#[derive(Debug, Clone)]
pub struct SourceReport {
    /// Position of the source in configuration order.
    pub index: usize,
    pub update: SourceUpdate,
}

/// Timing policy between fetches of one source.
#[derive(Debug, Clone, Copy)]
pub struct RefreshSchedule {
    pub jitter_fraction: f64,
    pub failure_backoff: Duration,
    pub max_backoff: Duration,
}

impl RefreshSchedule {
    pub fn from_limits(limits: &LimitsConfig) -> Self {
        Self {
            jitter_fraction: limits.jitter_fraction,
            failure_backoff: limits.failure_backoff(),
            max_backoff: limits.max_backoff(),
        }
    }

    /// Delay before the next attempt given the outcome just recorded on `source`.
    pub fn next_delay(&self, source: &Source) -> Duration {
        let base = match source.phase {
            SourcePhase::Failed => {
                failure_backoff(source.consecutive_failures, self.failure_backoff, self.max_backoff)
            }
            _ => source.refresh_interval,
        };
        base + jitter(base, self.jitter_fraction)
    }
}

impl Default for RefreshSchedule {
    fn default() -> Self {
        Self::from_limits(&LimitsConfig::default())
    }
}

/// Uniform random duration in `[0, base * fraction]`.
pub fn jitter(base: Duration, fraction: f64) -> Duration {
    let fraction = fraction.clamp(0.0, 1.0);
    base.mul_f64(fraction * fastrand::f64())
}

/// `min(base * 2^(failures - 1), max)`.
pub fn failure_backoff(consecutive_failures: u32, base: Duration, max: Duration) -> Duration {
    let exponent = consecutive_failures.saturating_sub(1).min(31);
    base.saturating_mul(1u32 << exponent).min(max)
}

/// Long-lived task that owns one `Source` and refreshes it on its own schedule.
pub struct SourceRefreshJob {
    index: usize,
    source: Source,
    refresh: Arc<RefreshSourceUseCase>,
    reports: mpsc::Sender<SourceReport>,
    schedule: RefreshSchedule,
    board: Option<Arc<StatusBoard>>,
    shutdown: CancellationToken,
}

impl SourceRefreshJob {
    pub fn new(
        index: usize,
        source: Source,
        refresh: Arc<RefreshSourceUseCase>,
        reports: mpsc::Sender<SourceReport>,
    ) -> Self {
        Self {
            index,
            source,
            refresh,
            reports,
            schedule: RefreshSchedule::default(),
            board: None,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_schedule(mut self, schedule: RefreshSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// The job writes its own slot on the board at every phase change.
    pub fn with_status_board(mut self, board: Arc<StatusBoard>) -> Self {
        self.board = Some(board);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn source_name(&self) -> &str {
        &self.source.name
    }

    pub fn start(self) -> JoinHandle<()> {
        info!(
            source = %self.source.name,
            interval_secs = self.source.refresh_interval.as_secs(),
            format = self.source.format.as_str(),
            "Starting source refresh job"
        );
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        loop {
            let update = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                update = self.refresh.execute(&mut self.source) => update,
            };
            self.post_status();

            let report = SourceReport {
                index: self.index,
                update,
            };
            if self.reports.send(report).await.is_err() {
                debug!(source = %self.source.name, "Report channel closed");
                break;
            }

            let delay = self.schedule.next_delay(&self.source);
            debug!(
                source = %self.source.name,
                outcome = ?self.source.phase,
                delay_secs = delay.as_secs(),
                "Next refresh scheduled"
            );
            self.source.phase = SourcePhase::Idle;
            self.post_status();

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.source.phase = SourcePhase::Idle;
        self.post_status();
        info!(source = %self.source.name, "Source refresh job stopped");
    }

    fn post_status(&self) {
        if let Some(board) = &self.board {
            board.update_source(self.index, SourceStatus::from_source(&self.source));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrous_feed_domain::{FetchError, SourceFormat};

    fn source(interval: Duration) -> Source {
        Source::new(
            "test",
            "https://lists.example/x",
            SourceFormat::Domains,
            interval,
            true,
        )
    }

    fn schedule() -> RefreshSchedule {
        RefreshSchedule {
            jitter_fraction: 0.1,
            failure_backoff: Duration::from_secs(60),
            max_backoff: Duration::from_secs(3600),
        }
    }

    #[test]
    fn test_jitter_within_bounds() {
        let base = Duration::from_secs(100);
        for _ in 0..1000 {
            let j = jitter(base, 0.1);
            assert!(j <= Duration::from_secs(10));
        }
        assert_eq!(jitter(base, 0.0), Duration::ZERO);
    }

    #[test]
    fn test_failure_backoff_doubles_and_caps() {
        let base = Duration::from_secs(60);
        let max = Duration::from_secs(3600);
        assert_eq!(failure_backoff(1, base, max), Duration::from_secs(60));
        assert_eq!(failure_backoff(2, base, max), Duration::from_secs(120));
        assert_eq!(failure_backoff(3, base, max), Duration::from_secs(240));
        assert_eq!(failure_backoff(10, base, max), max);
        assert_eq!(failure_backoff(200, base, max), max);
    }

    #[test]
    fn test_success_delay_is_interval_plus_jitter() {
        let mut s = source(Duration::from_secs(1000));
        s.record_attempt();
        s.record_not_modified();

        for _ in 0..100 {
            let delay = schedule().next_delay(&s);
            assert!(delay >= Duration::from_secs(1000));
            assert!(delay <= Duration::from_secs(1100));
        }
    }

    #[test]
    fn test_failure_delay_uses_backoff_not_interval() {
        let mut s = source(Duration::from_secs(1000));
        s.record_attempt();
        s.record_failure(&FetchError::Timeout);
        s.record_attempt();
        s.record_failure(&FetchError::Timeout);

        let delay = schedule().next_delay(&s);
        assert!(delay >= Duration::from_secs(120));
        assert!(delay <= Duration::from_secs(132));
    }

    #[test]
    fn test_schedule_resumes_after_success() {
        let mut s = source(Duration::from_secs(1000));
        s.record_attempt();
        s.record_failure(&FetchError::Status(503));
        s.record_attempt();
        s.record_updated(Default::default());

        assert!(schedule().next_delay(&s) >= Duration::from_secs(1000));
    }
}
