use ferrous_feed_domain::{
    AllowList, CanonicalSet, DomainEntry, DomainError, LevelSet, NormalizedDomain,
    ScopeConflictPolicy,
};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// What one source brings to an aggregation cycle.
#[derive(Debug, Clone)]
pub enum ContributionState {
    /// The source has not completed a fetch yet.
    Pending,
    /// Entries from the latest successful fetch (or a confirmed-unchanged one).
    Fresh(Arc<[DomainEntry]>),
    /// The latest fetch failed. `cycles_failed` counts the aggregation cycles
    /// that already ran while this failure was current; `last_good` holds the
    /// entries of the source's last successful parse, if any.
    Failed {
        cycles_failed: u32,
        last_good: Option<Arc<[DomainEntry]>>,
    },
}

#[derive(Debug, Clone)]
pub struct SourceContribution {
    pub name: Arc<str>,
    pub degrade_gracefully: bool,
    pub security_level: u32,
    pub state: ContributionState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationStats {
    pub fresh_sources: usize,
    pub retained_sources: usize,
    pub dropped_sources: usize,
    pub input_entries: usize,
    pub duplicates: usize,
    pub scope_upgrades: usize,
    pub retained_entries: usize,
    pub allow_removed: usize,
}

#[derive(Debug)]
pub struct AggregationOutcome {
    pub set: CanonicalSet,
    pub stats: AggregationStats,
}

/// Merges per-source entries into one `CanonicalSet`.
///
/// Sources are visited in configuration order and the first source to claim a
/// domain keeps it, so the same inputs always produce the same membership and
/// provenance.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregationEngine {
    policy: ScopeConflictPolicy,
}

impl AggregationEngine {
    pub fn new(policy: ScopeConflictPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ScopeConflictPolicy {
        self.policy
    }

    /// Build the canonical set for one cycle.
    ///
    /// A failed source in degrade-gracefully mode keeps its last-known-good
    /// entries for exactly one cycle (from `last_good`, or failing that the
    /// entries it owned in `previous`); in strict mode it contributes
    /// nothing. Fails with `TotalBlackout` when no source produced a single
    /// fresh entry, so the caller keeps serving the previous feed.
    ///
    /// When sources span several security levels, the result also carries
    /// one cumulative set per level above the lowest: level `n` merges every
    /// source whose level is `n` or higher.
    pub fn aggregate(
        &self,
        contributions: &[SourceContribution],
        allow: &AllowList,
        previous: Option<&CanonicalSet>,
    ) -> Result<AggregationOutcome, DomainError> {
        let mut stats = AggregationStats::default();
        let (merged, fresh_sources) =
            self.merge(contributions.iter(), allow, previous, &mut stats);

        if fresh_sources.is_empty() {
            return Err(DomainError::TotalBlackout);
        }

        debug!(
            domains = merged.len(),
            duplicates = stats.duplicates,
            allow_removed = stats.allow_removed,
            retained = stats.retained_entries,
            "Canonical set merged"
        );

        let levels: BTreeSet<u32> = contributions.iter().map(|c| c.security_level).collect();
        let mut levels = levels.into_iter();
        let base_level = levels.next().unwrap_or_default();

        let tiers = levels
            .map(|level| {
                let (tier, tier_sources) = self.merge(
                    contributions.iter().filter(|c| c.security_level >= level),
                    allow,
                    previous,
                    &mut AggregationStats::default(),
                );
                debug!(level, domains = tier.len(), "Security level merged");
                LevelSet {
                    level,
                    set: CanonicalSet::new(tier, tier_sources),
                }
            })
            .collect();

        Ok(AggregationOutcome {
            set: CanonicalSet::new(merged, fresh_sources).with_levels(base_level, tiers),
            stats,
        })
    }

    fn merge<'a>(
        &self,
        contributions: impl Iterator<Item = &'a SourceContribution>,
        allow: &AllowList,
        previous: Option<&CanonicalSet>,
        stats: &mut AggregationStats,
    ) -> (BTreeMap<NormalizedDomain, DomainEntry>, Vec<Arc<str>>) {
        let mut merged: BTreeMap<NormalizedDomain, DomainEntry> = BTreeMap::new();
        let mut fresh_sources = Vec::new();

        for contribution in contributions {
            match &contribution.state {
                ContributionState::Pending => {}
                ContributionState::Fresh(entries) => {
                    if !entries.is_empty() {
                        fresh_sources.push(Arc::clone(&contribution.name));
                        stats.fresh_sources += 1;
                    }
                    for entry in entries.iter() {
                        stats.input_entries += 1;
                        self.insert(&mut merged, entry, stats);
                    }
                }
                ContributionState::Failed {
                    cycles_failed,
                    last_good,
                } => {
                    let retain = contribution.degrade_gracefully && *cycles_failed == 0;
                    match (retain, last_good, previous) {
                        (true, Some(entries), _) => {
                            stats.retained_sources += 1;
                            for entry in entries.iter() {
                                stats.retained_entries += 1;
                                self.insert(&mut merged, entry, stats);
                            }
                        }
                        (true, None, Some(prev)) => {
                            stats.retained_sources += 1;
                            for entry in prev.entries_from(&contribution.name) {
                                stats.retained_entries += 1;
                                self.insert(&mut merged, entry, stats);
                            }
                        }
                        _ => stats.dropped_sources += 1,
                    }
                }
            }
        }

        let before = merged.len();
        merged.retain(|domain, _| !allow.is_allowed(domain.as_str()));
        stats.allow_removed = before - merged.len();

        (merged, fresh_sources)
    }

    fn insert(
        &self,
        merged: &mut BTreeMap<NormalizedDomain, DomainEntry>,
        entry: &DomainEntry,
        stats: &mut AggregationStats,
    ) {
        match merged.entry(entry.domain.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(entry.clone());
            }
            Entry::Occupied(mut slot) => {
                let upgrade = self.policy == ScopeConflictPolicy::WidestScope
                    && entry.scope.is_wider_than(slot.get().scope);
                if upgrade {
                    slot.insert(entry.clone());
                    stats.scope_upgrades += 1;
                } else {
                    stats.duplicates += 1;
                }
            }
        }
    }
}
