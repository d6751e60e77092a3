use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do when two sources report the same domain with different scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScopeConflictPolicy {
    /// The entry from the source listed first in configuration wins whole.
    #[default]
    FirstSource,
    /// A later subdomain-inclusive entry replaces an earlier exact one.
    WidestScope,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub scope_conflict: ScopeConflictPolicy,

    /// Completions arriving within this window share one aggregation
    pub batch_window_ms: u64,

    /// Longest wait for every source's first report before the first cycle
    pub startup_grace_secs: u64,
}

impl AggregationConfig {
    pub fn batch_window(&self) -> Duration {
        Duration::from_millis(self.batch_window_ms)
    }

    pub fn startup_grace(&self) -> Duration {
        Duration::from_secs(self.startup_grace_secs)
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            scope_conflict: ScopeConflictPolicy::FirstSource,
            batch_window_ms: 2000,
            startup_grace_secs: 120,
        }
    }
}
