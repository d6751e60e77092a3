use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Global fetch limits shared by every source.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest accepted response body (default: 50 MiB)
    pub max_body_bytes: u64,

    /// Timeout for a single fetch attempt
    pub fetch_timeout_secs: u64,

    /// Extra attempts after the first one within a cycle
    pub max_retries: u32,

    /// Delay before the first retry; doubles for each further retry
    pub retry_base_delay_ms: u64,

    /// Random jitter added to each schedule, as a fraction of the interval
    pub jitter_fraction: f64,

    /// Delay after the first failed cycle; doubles per consecutive failure
    pub failure_backoff_secs: u64,

    /// Ceiling for the failure backoff
    pub max_backoff_secs: u64,
}

impl LimitsConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn failure_backoff(&self) -> Duration {
        Duration::from_secs(self.failure_backoff_secs)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 50 * 1024 * 1024,
            fetch_timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 2000,
            jitter_fraction: 0.1,
            failure_backoff_secs: 60,
            max_backoff_secs: 3600,
        }
    }
}
