use crate::blocklist::SourceFormat;
use crate::config::SourceConfig;
use crate::FetchError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Where a source currently is in its refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourcePhase {
    #[default]
    Idle,
    Fetching,
    Parsed,
    Failed,
}

/// Opaque validators returned by the upstream for conditional requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheValidators {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl CacheValidators {
    pub fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }
}

/// Outcome of the most recent fetch attempt, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum FetchStatus {
    Updated,
    NotModified,
    Failed(String),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceStats {
    pub fetches: u64,
    pub not_modified: u64,
    pub failures: u64,
    pub parse_runs: u64,
    pub last_entries: usize,
    pub last_parse_errors: usize,
    pub last_invalid_domains: usize,
}

/// One configured upstream list plus its runtime cache state.
///
/// Owned by exactly one refresh task; never shared for writes.
#[derive(Debug, Clone)]
pub struct Source {
    pub name: Arc<str>,
    pub url: Arc<str>,
    pub format: SourceFormat,
    pub refresh_interval: Duration,
    pub degrade_gracefully: bool,
    pub security_level: u32,

    pub cache: CacheValidators,
    pub phase: SourcePhase,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_outcome: Option<FetchStatus>,
    pub consecutive_failures: u32,
    pub stats: SourceStats,
}

impl Source {
    pub fn new(
        name: impl Into<Arc<str>>,
        url: impl Into<Arc<str>>,
        format: SourceFormat,
        refresh_interval: Duration,
        degrade_gracefully: bool,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            format,
            refresh_interval,
            degrade_gracefully,
            security_level: 0,
            cache: CacheValidators::default(),
            phase: SourcePhase::Idle,
            last_attempt_at: None,
            last_success_at: None,
            last_outcome: None,
            consecutive_failures: 0,
            stats: SourceStats::default(),
        }
    }

    pub fn with_security_level(mut self, level: u32) -> Self {
        self.security_level = level;
        self
    }

    /// Build a source from an already-validated config entry.
    pub fn from_config(cfg: &SourceConfig) -> Self {
        Self::new(
            cfg.name.as_str(),
            cfg.url.as_str(),
            cfg.format,
            Duration::from_secs(cfg.refresh_interval_secs),
            cfg.degrade_gracefully,
        )
        .with_security_level(cfg.security_level)
    }

    pub fn record_attempt(&mut self) {
        self.phase = SourcePhase::Fetching;
        self.last_attempt_at = Some(Utc::now());
        self.stats.fetches += 1;
    }

    pub fn record_not_modified(&mut self) {
        self.phase = SourcePhase::Parsed;
        self.last_success_at = Some(Utc::now());
        self.last_outcome = Some(FetchStatus::NotModified);
        self.consecutive_failures = 0;
        self.stats.not_modified += 1;
    }

    pub fn record_updated(&mut self, validators: CacheValidators) {
        self.phase = SourcePhase::Parsed;
        self.cache = validators;
        self.last_success_at = Some(Utc::now());
        self.last_outcome = Some(FetchStatus::Updated);
        self.consecutive_failures = 0;
        self.stats.parse_runs += 1;
    }

    pub fn record_failure(&mut self, error: &FetchError) {
        self.phase = SourcePhase::Failed;
        self.last_outcome = Some(FetchStatus::Failed(error.to_string()));
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.stats.failures += 1;
    }
}
