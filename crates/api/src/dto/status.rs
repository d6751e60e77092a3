use chrono::{DateTime, Utc};
use ferrous_feed_application::services::{CycleSummary, SourceStatus};
use ferrous_feed_application::use_cases::{FeedStatus, GenerationInfo, LevelInfo};
use ferrous_feed_domain::{FetchStatus, SourcePhase};
use serde::Serialize;

#[derive(Serialize, Debug, Clone)]
pub struct StatusResponse {
    pub generation: Option<GenerationResponse>,
    pub cycle: CycleResponse,
    pub sources: Vec<SourceStatusResponse>,
}

#[derive(Serialize, Debug, Clone)]
pub struct GenerationResponse {
    pub generation: u64,
    pub built_at: DateTime<Utc>,
    pub domains: usize,
    pub parts: usize,
    pub bytes: usize,
    pub etag: String,
    pub levels: Vec<LevelResponse>,
}

#[derive(Serialize, Debug, Clone)]
pub struct LevelResponse {
    pub level: u32,
    pub domains: usize,
    pub parts: usize,
}

#[derive(Serialize, Debug, Clone)]
pub struct CycleResponse {
    pub cycles: u64,
    pub blackouts: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_blackout_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Debug, Clone)]
pub struct SourceStatusResponse {
    pub name: String,
    pub url: String,
    pub format: &'static str,
    pub phase: SourcePhase,
    pub last_outcome: Option<FetchStatus>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub entries: usize,
    pub parse_errors: usize,
    pub consecutive_failures: u32,
    pub degrade_gracefully: bool,
    pub security_level: u32,
    pub fetches: u64,
    pub not_modified: u64,
    pub failures: u64,
}

impl From<GenerationInfo> for GenerationResponse {
    fn from(g: GenerationInfo) -> Self {
        Self {
            generation: g.generation,
            built_at: g.built_at,
            domains: g.domains,
            parts: g.parts,
            bytes: g.bytes,
            etag: g.etag,
            levels: g.levels.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<LevelInfo> for LevelResponse {
    fn from(l: LevelInfo) -> Self {
        Self {
            level: l.level,
            domains: l.domains,
            parts: l.parts,
        }
    }
}

impl From<CycleSummary> for CycleResponse {
    fn from(c: CycleSummary) -> Self {
        Self {
            cycles: c.cycles,
            blackouts: c.blackouts,
            last_cycle_at: c.last_cycle_at,
            last_blackout_at: c.last_blackout_at,
        }
    }
}

impl From<SourceStatus> for SourceStatusResponse {
    fn from(s: SourceStatus) -> Self {
        Self {
            name: s.name.to_string(),
            url: s.url.to_string(),
            format: s.format,
            phase: s.phase,
            last_outcome: s.last_outcome,
            last_attempt_at: s.last_attempt_at,
            last_success_at: s.last_success_at,
            entries: s.stats.last_entries,
            parse_errors: s.stats.last_parse_errors,
            consecutive_failures: s.consecutive_failures,
            degrade_gracefully: s.degrade_gracefully,
            security_level: s.security_level,
            fetches: s.stats.fetches,
            not_modified: s.stats.not_modified,
            failures: s.stats.failures,
        }
    }
}

impl From<FeedStatus> for StatusResponse {
    fn from(status: FeedStatus) -> Self {
        Self {
            generation: status.generation.map(Into::into),
            cycle: status.cycle.into(),
            sources: status.sources.into_iter().map(Into::into).collect(),
        }
    }
}
