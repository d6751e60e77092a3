use crate::ports::FeedPublisherPort;
use crate::services::{CycleSummary, SourceStatus, StatusBoard};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct GenerationInfo {
    pub generation: u64,
    pub built_at: DateTime<Utc>,
    pub domains: usize,
    pub parts: usize,
    pub bytes: usize,
    pub etag: String,
    pub levels: Vec<LevelInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelInfo {
    pub level: u32,
    pub domains: usize,
    pub parts: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedStatus {
    pub generation: Option<GenerationInfo>,
    pub cycle: CycleSummary,
    pub sources: Vec<SourceStatus>,
}

pub struct GetFeedStatusUseCase {
    board: Arc<StatusBoard>,
    publisher: Arc<dyn FeedPublisherPort>,
}

impl GetFeedStatusUseCase {
    pub fn new(board: Arc<StatusBoard>, publisher: Arc<dyn FeedPublisherPort>) -> Self {
        Self { board, publisher }
    }

    pub fn execute(&self) -> FeedStatus {
        let generation = self.publisher.current().map(|g| GenerationInfo {
            generation: g.generation,
            built_at: g.built_at,
            domains: g.domain_count,
            parts: g.part_count(),
            bytes: g.body.len(),
            etag: g.etag.clone(),
            levels: g
                .level_numbers()
                .into_iter()
                .filter_map(|n| g.level(n))
                .map(|l| LevelInfo {
                    level: l.level,
                    domains: l.domain_count,
                    parts: l.part_count(),
                })
                .collect(),
        });

        FeedStatus {
            generation,
            cycle: CycleSummary::clone(&self.board.cycle()),
            sources: Vec::clone(&self.board.sources()),
        }
    }
}
