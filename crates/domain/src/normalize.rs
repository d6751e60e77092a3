use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const MAX_DOMAIN_LENGTH: usize = 253;
pub const MAX_LABEL_LENGTH: usize = 63;

/// A domain in canonical comparable form: lowercase ASCII (punycode for
/// internationalized labels), no trailing dot, validated label lengths.
///
/// Uses `Arc<str>` so entries can be shared between cycles without copying.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedDomain(Arc<str>);

impl NormalizedDomain {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parent domains from nearest to farthest, excluding the domain itself
    /// and the bare TLD. `a.b.example.com` yields `b.example.com`, `example.com`.
    pub fn parents(&self) -> impl Iterator<Item = &str> {
        let s: &str = &self.0;
        s.match_indices('.')
            .map(move |(idx, _)| &s[idx + 1..])
            .filter(|rest| rest.contains('.'))
    }
}

impl fmt::Display for NormalizedDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for NormalizedDomain {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Canonicalize a raw domain string.
///
/// Steps: trim, lowercase, strip one trailing dot, IDNA to ASCII, validate.
/// Applying it to its own output returns the same value.
pub fn normalize_domain(raw: &str) -> Result<NormalizedDomain, DomainError> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);

    if trimmed.is_empty() {
        return Err(DomainError::InvalidDomainName(raw.to_string()));
    }

    let ascii = if trimmed.is_ascii() {
        trimmed.to_ascii_lowercase()
    } else {
        idna::domain_to_ascii(trimmed)
            .map_err(|_| DomainError::InvalidDomainName(raw.to_string()))?
    };

    validate_ascii_domain(&ascii).map_err(|reason| {
        DomainError::InvalidDomainName(format!("{}: {}", raw.trim(), reason))
    })?;

    Ok(NormalizedDomain(Arc::from(ascii)))
}

fn validate_ascii_domain(domain: &str) -> Result<(), &'static str> {
    if domain.len() > MAX_DOMAIN_LENGTH {
        return Err("exceeds 253 characters");
    }

    let mut labels = 0usize;
    let mut last = "";
    for label in domain.split('.') {
        if label.is_empty() {
            return Err("empty label");
        }
        if label.len() > MAX_LABEL_LENGTH {
            return Err("label exceeds 63 characters");
        }
        if !label
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return Err("disallowed character");
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err("label starts or ends with a hyphen");
        }
        labels += 1;
        last = label;
    }

    if labels < 2 {
        return Err("missing top-level domain");
    }
    if last.bytes().all(|b| b.is_ascii_digit()) {
        return Err("numeric top-level label");
    }

    Ok(())
}
