use super::{
    AggregationConfig, ConfigError, FeedConfig, LimitsConfig, LoggingConfig, ServerConfig,
    SourceConfig,
};
use crate::validators::{validate_source_name, validate_url};
use crate::AllowList;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Values from the command line that win over the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Load from `path` (or defaults when `None`) and apply CLI overrides.
    pub fn load(path: Option<&str>, overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => {
                let text = std::fs::read_to_string(Path::new(p)).map_err(|source| {
                    ConfigError::Io {
                        path: p.to_string(),
                        source,
                    }
                })?;
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };

        config.apply_overrides(overrides);
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn apply_overrides(&mut self, overrides: CliOverrides) {
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [[sources]] entry is required".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            validate_source_name(&source.name, "Source").map_err(ConfigError::Invalid)?;
            validate_url(&source.url).map_err(|e| {
                ConfigError::Invalid(format!("source '{}': {}", source.name, e))
            })?;
            if source.refresh_interval_secs == 0 {
                return Err(ConfigError::Invalid(format!(
                    "source '{}': refresh_interval_secs must be greater than 0",
                    source.name
                )));
            }
            if !names.insert(source.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
        }

        let limits = &self.limits;
        if !(0.0..=1.0).contains(&limits.jitter_fraction) {
            return Err(ConfigError::Invalid(
                "limits.jitter_fraction must be between 0 and 1".to_string(),
            ));
        }
        if limits.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "limits.fetch_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if limits.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "limits.max_body_bytes must be greater than 0".to_string(),
            ));
        }
        if limits.failure_backoff_secs == 0 {
            return Err(ConfigError::Invalid(
                "limits.failure_backoff_secs must be greater than 0".to_string(),
            ));
        }
        if limits.max_retries > 0 && limits.retry_base_delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "limits.retry_base_delay_ms must be greater than 0 when retries are enabled"
                    .to_string(),
            ));
        }
        if limits.max_backoff_secs < limits.failure_backoff_secs {
            return Err(ConfigError::Invalid(
                "limits.max_backoff_secs must not be below limits.failure_backoff_secs"
                    .to_string(),
            ));
        }

        if self.feed.max_lines_per_part == 0 {
            return Err(ConfigError::Invalid(
                "feed.max_lines_per_part must be greater than 0".to_string(),
            ));
        }
        AllowList::parse(&self.feed.allow).map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if !self.server.feed_path.starts_with('/') || self.server.feed_path.len() < 2 {
            return Err(ConfigError::Invalid(
                "server.feed_path must start with '/' and not be the root".to_string(),
            ));
        }
        if self.server.feed_path.starts_with("/api") {
            return Err(ConfigError::Invalid(
                "server.feed_path must not live under /api".to_string(),
            ));
        }

        self.logging
            .level
            .parse::<tracing::Level>()
            .map_err(|_| {
                ConfigError::Invalid(format!("unknown log level '{}'", self.logging.level))
            })?;

        Ok(())
    }
}
