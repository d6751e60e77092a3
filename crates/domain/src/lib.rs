//! Ferrous Feed Domain Layer
pub mod allow_list;
pub mod blocklist;
pub mod canonical_set;
pub mod config;
pub mod entry;
pub mod errors;
pub mod feed_generation;
pub mod normalize;
pub mod source;
pub mod validators;

pub use allow_list::{AllowList, AllowOverride};
pub use blocklist::{parse_declared, parse_list, NormalizedBatch, ParseReport, SourceFormat};
pub use canonical_set::{CanonicalSet, LevelSet};
pub use config::{CliOverrides, Config, ConfigError, ScopeConflictPolicy};
pub use entry::{DomainEntry, EntryScope};
pub use errors::{DomainError, FetchError};
pub use feed_generation::{FeedGeneration, LevelFeed};
pub use normalize::{normalize_domain, NormalizedDomain};
pub use source::{CacheValidators, FetchStatus, Source, SourcePhase, SourceStats};
