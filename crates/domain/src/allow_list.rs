use crate::{normalize_domain, DomainError, EntryScope, NormalizedDomain};
use compact_str::CompactString;
use rustc_hash::{FxBuildHasher, FxHashSet};
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::HashMap;

/// A domain that must never appear in a published feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllowOverride {
    pub domain: NormalizedDomain,
    pub scope: EntryScope,
}

impl AllowOverride {
    /// Parse an override as written in configuration.
    ///
    /// - `example.com`        → exact
    /// - `*.example.com`      → example.com and every subdomain
    /// - `||example.com^`     → example.com and every subdomain
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let raw = raw.trim();

        let (domain, scope) = if let Some(rest) = raw.strip_prefix("*.") {
            (rest, EntryScope::Subdomains)
        } else if let Some(rest) = raw.strip_prefix("||").and_then(|r| r.strip_suffix('^')) {
            (rest, EntryScope::Subdomains)
        } else {
            (raw, EntryScope::Exact)
        };

        let domain = normalize_domain(domain)
            .map_err(|e| DomainError::InvalidOverride(format!("{raw}: {e}")))?;

        Ok(Self { domain, scope })
    }
}

#[derive(Default)]
struct TrieNode {
    children: HashMap<CompactString, TrieNode, FxBuildHasher>,
    /// Set when an override covering this node and everything below ends here.
    covers_subtree: bool,
}

/// Reversed-label suffix trie.
///
/// `example.com` with subtree coverage → traverse ["com", "example"] and mark
/// the "example" node. Lookup for `a.example.com` walks ["com", "example", "a"]
/// and matches at "example". Unlike a `*.` block wildcard, the apex itself
/// matches as well.
#[derive(Default)]
struct SuffixTrie {
    root: TrieNode,
}

impl SuffixTrie {
    fn insert(&mut self, domain: &str) {
        let mut node = &mut self.root;
        for label in domain.split('.').rev() {
            node = node.children.entry(CompactString::new(label)).or_default();
        }
        node.covers_subtree = true;
    }

    fn covers(&self, domain: &str) -> bool {
        let labels: SmallVec<[&str; 8]> = domain.split('.').rev().collect();
        let mut node = &self.root;
        for label in labels {
            match node.children.get(label) {
                Some(child) => {
                    if child.covers_subtree {
                        return true;
                    }
                    node = child;
                }
                None => return false,
            }
        }
        false
    }
}

/// Immutable set of allow overrides consulted after each merge.
#[derive(Default)]
pub struct AllowList {
    exact: FxHashSet<NormalizedDomain>,
    subtree: SuffixTrie,
    overrides: Vec<AllowOverride>,
}

impl AllowList {
    pub fn new(overrides: Vec<AllowOverride>) -> Self {
        let mut list = Self::default();
        for o in &overrides {
            match o.scope {
                EntryScope::Exact => {
                    list.exact.insert(o.domain.clone());
                }
                EntryScope::Subdomains => list.subtree.insert(o.domain.as_str()),
            }
        }
        list.overrides = overrides;
        list
    }

    /// Parse a list of raw override strings, failing on the first invalid one.
    pub fn parse<S: AsRef<str>>(raw: &[S]) -> Result<Self, DomainError> {
        let overrides = raw
            .iter()
            .map(|r| AllowOverride::parse(r.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(overrides))
    }

    pub fn is_allowed(&self, domain: &str) -> bool {
        self.exact.contains(domain) || self.subtree.covers(domain)
    }

    pub fn overrides(&self) -> &[AllowOverride] {
        &self.overrides
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

impl std::fmt::Debug for AllowList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllowList")
            .field("overrides", &self.overrides.len())
            .finish()
    }
}
