use crate::NormalizedDomain;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How much of the namespace below a domain an entry covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntryScope {
    /// Only the domain itself.
    #[default]
    Exact,
    /// The domain and every subdomain below it.
    Subdomains,
}

impl EntryScope {
    pub fn is_wider_than(self, other: EntryScope) -> bool {
        matches!((self, other), (EntryScope::Subdomains, EntryScope::Exact))
    }
}

/// A normalized domain with its provenance. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEntry {
    pub domain: NormalizedDomain,
    pub source: Arc<str>,
    pub scope: EntryScope,
}

impl DomainEntry {
    pub fn new(domain: NormalizedDomain, source: Arc<str>, scope: EntryScope) -> Self {
        Self {
            domain,
            source,
            scope,
        }
    }
}
