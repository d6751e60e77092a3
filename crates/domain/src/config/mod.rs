//! Configuration module for Ferrous Feed
//!
//! This module contains all configuration structures organized by concern:
//! - `root`: Main configuration, loading/validation and CLI overrides
//! - `server`: Feed HTTP listener and path
//! - `logging`: Logging settings
//! - `limits`: Fetch timeout, retry, size and schedule limits
//! - `aggregation`: Merge policy and batching
//! - `feed`: Rendering, partitioning, snapshot and allow overrides
//! - `source`: Upstream list entries
//! - `errors`: Configuration errors

pub mod aggregation;
pub mod errors;
pub mod feed;
pub mod limits;
pub mod logging;
pub mod root;
pub mod server;
pub mod source;

pub use aggregation::{AggregationConfig, ScopeConflictPolicy};
pub use errors::ConfigError;
pub use feed::{FeedConfig, FeedFormat, DEFAULT_MAX_LINES_PER_PART};
pub use limits::LimitsConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
pub use source::SourceConfig;
