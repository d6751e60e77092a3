use bytes::Bytes;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// One rendered, immutable feed artifact.
///
/// `body` is the complete feed; `parts` is the same content split into
/// slices no larger than the appliance's per-feed line ceiling. The complete
/// feed is also the feed of `base_level`; higher security levels are in
/// `levels`, all built from the same cycle.
#[derive(Debug, Clone)]
pub struct FeedGeneration {
    pub generation: u64,
    pub built_at: DateTime<Utc>,
    pub body: Bytes,
    pub parts: Vec<Bytes>,
    pub domain_count: usize,
    pub dropped_entries: usize,
    pub etag: String,
    pub base_level: u32,
    pub levels: Vec<LevelFeed>,
}

/// Rendered feed of one security level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelFeed {
    pub level: u32,
    pub body: Bytes,
    pub parts: Vec<Bytes>,
    pub domain_count: usize,
    pub dropped_entries: usize,
}

impl LevelFeed {
    pub fn part(&self, index: usize) -> Option<&Bytes> {
        self.parts.get(index)
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }
}

impl FeedGeneration {
    pub fn part(&self, index: usize) -> Option<&Bytes> {
        self.parts.get(index)
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// The feed of `level`, if that level is configured.
    pub fn level(&self, level: u32) -> Option<LevelFeed> {
        if level == self.base_level {
            return Some(LevelFeed {
                level,
                body: self.body.clone(),
                parts: self.parts.clone(),
                domain_count: self.domain_count,
                dropped_entries: self.dropped_entries,
            });
        }
        self.levels.iter().find(|l| l.level == level).cloned()
    }

    /// Every servable level, lowest first.
    pub fn level_numbers(&self) -> Vec<u32> {
        std::iter::once(self.base_level)
            .chain(self.levels.iter().map(|l| l.level))
            .collect()
    }

    /// True when both generations would serve the same bytes on every path.
    pub fn same_content(&self, other: &FeedGeneration) -> bool {
        self.base_level == other.base_level
            && self.body == other.body
            && self.parts == other.parts
            && self.levels == other.levels
    }

    /// Strong entity tag derived from the generation number and content.
    pub fn compute_etag(generation: u64, body: &[u8]) -> String {
        let digest = Sha256::digest(body);
        let short: String = digest[..8].iter().map(|b| format!("{b:02x}")).collect();
        format!("\"{generation}-{short}\"")
    }
}
