use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Line syntax of the rendered feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeedFormat {
    /// One bare domain per line.
    #[default]
    Domains,
    /// FortiGate domain threat feed: `domain`, plus `*.domain` for
    /// subdomain-inclusive entries.
    Wildcard,
    /// hosts-file lines: `0.0.0.0 domain`.
    Hosts,
}

/// FortiGate accepts at most this many entries per external threat feed.
pub const DEFAULT_MAX_LINES_PER_PART: usize = 131_000;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedConfig {
    pub format: FeedFormat,

    pub max_lines_per_part: usize,

    /// File name prefix for parts written to the snapshot directory
    pub part_prefix: String,

    /// Where the last published generation is persisted (optional)
    pub snapshot_dir: Option<PathBuf>,

    /// Domains that must never be published (`*.` covers subdomains)
    pub allow: Vec<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            format: FeedFormat::Domains,
            max_lines_per_part: DEFAULT_MAX_LINES_PER_PART,
            part_prefix: "ferrous-feed".to_string(),
            snapshot_dir: None,
            allow: vec![],
        }
    }
}
