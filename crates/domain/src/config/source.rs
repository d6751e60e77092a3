use crate::blocklist::SourceFormat;
use serde::{Deserialize, Serialize};

/// One upstream blocklist as written in configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    pub name: String,

    pub url: String,

    pub format: SourceFormat,

    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Keep last-known-good entries for one cycle when a fetch fails
    #[serde(default = "default_degrade_gracefully")]
    pub degrade_gracefully: bool,

    /// Tier this list belongs to. The feed for level `n` carries every
    /// source whose level is `n` or higher.
    #[serde(default)]
    pub security_level: u32,
}

fn default_refresh_interval() -> u64 {
    3600
}

fn default_degrade_gracefully() -> bool {
    true
}
