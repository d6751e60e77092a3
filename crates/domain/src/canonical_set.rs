use crate::{DomainEntry, NormalizedDomain};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

/// The merged, deduplicated result of one aggregation cycle.
///
/// Keyed by normalized domain in sorted order so that rendering the same
/// membership always yields the same bytes. Built once, then shared read-only
/// behind an `Arc`; the next cycle builds a new one.
///
/// The set itself covers every source and so doubles as the feed for the
/// lowest configured security level (`base_level`). Higher levels, if any,
/// are carried in `levels`.
#[derive(Debug, Clone)]
pub struct CanonicalSet {
    entries: BTreeMap<NormalizedDomain, DomainEntry>,
    fresh_sources: Vec<Arc<str>>,
    built_at: DateTime<Utc>,
    base_level: u32,
    levels: Vec<LevelSet>,
}

/// Cumulative membership of one security level above the base level.
#[derive(Debug, Clone)]
pub struct LevelSet {
    pub level: u32,
    pub set: CanonicalSet,
}

impl CanonicalSet {
    pub fn new(
        entries: BTreeMap<NormalizedDomain, DomainEntry>,
        fresh_sources: Vec<Arc<str>>,
    ) -> Self {
        Self {
            entries,
            fresh_sources,
            built_at: Utc::now(),
            base_level: 0,
            levels: Vec::new(),
        }
    }

    /// Attach the per-level sets. `levels` must be sorted and above `base_level`.
    pub fn with_levels(mut self, base_level: u32, levels: Vec<LevelSet>) -> Self {
        self.base_level = base_level;
        self.levels = levels;
        self
    }

    pub fn empty() -> Self {
        Self::new(BTreeMap::new(), Vec::new())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, domain: &str) -> Option<&DomainEntry> {
        self.entries.get(domain)
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.entries.contains_key(domain)
    }

    pub fn entries(&self) -> impl Iterator<Item = &DomainEntry> {
        self.entries.values()
    }

    /// Entries whose winning provenance is `source`.
    pub fn entries_from<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a DomainEntry> {
        self.entries.values().filter(move |e| &*e.source == source)
    }

    pub fn count_from(&self, source: &str) -> usize {
        self.entries_from(source).count()
    }

    /// Sources that contributed freshly fetched entries in this cycle.
    pub fn fresh_sources(&self) -> &[Arc<str>] {
        &self.fresh_sources
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn base_level(&self) -> u32 {
        self.base_level
    }

    pub fn levels(&self) -> &[LevelSet] {
        &self.levels
    }
}
