use super::format::SourceFormat;
use crate::{normalize_domain, DomainEntry, DomainError, EntryScope};
use std::net::IpAddr;
use std::sync::Arc;

/// Keep at most this many sample errors per parse for diagnostics.
const MAX_SAMPLE_ERRORS: usize = 8;

/// Names that show up in every hosts file and never belong in a feed.
const HOSTS_SELF_REFERENCES: &[&str] = &[
    "localhost",
    "localhost.localdomain",
    "local",
    "broadcasthost",
    "0.0.0.0",
    "ip6-localhost",
    "ip6-loopback",
    "ip6-localnet",
    "ip6-mcastprefix",
    "ip6-allnodes",
    "ip6-allrouters",
    "ip6-allhosts",
];

/// One raw domain extracted from a list line, not yet normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub domain: String,
    pub scope: EntryScope,
    pub line: usize,
}

/// Result of parsing one list body. Never fails for content reasons.
#[derive(Debug, Default)]
pub struct ParseReport {
    pub entries: Vec<ParsedLine>,
    /// Blank and comment lines.
    pub skipped: usize,
    /// Malformed or unsupported lines.
    pub errors: usize,
    pub sample_errors: Vec<DomainError>,
}

/// Normalized entries of one source plus the number of rejected domains.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub entries: Vec<DomainEntry>,
    pub invalid: usize,
    pub sample_errors: Vec<DomainError>,
}

impl ParseReport {
    fn push(&mut self, domain: &str, scope: EntryScope, line: usize) {
        self.entries.push(ParsedLine {
            domain: domain.to_string(),
            scope,
            line,
        });
    }

    fn malformed(&mut self, line: usize, reason: &str) {
        self.errors += 1;
        if self.sample_errors.len() < MAX_SAMPLE_ERRORS {
            self.sample_errors.push(DomainError::ParseError {
                line,
                reason: reason.to_string(),
            });
        }
    }

    /// Run every parsed domain through the normalizer and tag it with its
    /// provenance. Domains that fail normalization are dropped and counted.
    pub fn normalize(self, source: &Arc<str>) -> NormalizedBatch {
        let mut batch = NormalizedBatch {
            entries: Vec::with_capacity(self.entries.len()),
            ..Default::default()
        };

        for parsed in self.entries {
            match normalize_domain(&parsed.domain) {
                Ok(domain) => batch
                    .entries
                    .push(DomainEntry::new(domain, Arc::clone(source), parsed.scope)),
                Err(e) => {
                    batch.invalid += 1;
                    if batch.sample_errors.len() < MAX_SAMPLE_ERRORS {
                        batch.sample_errors.push(DomainError::ParseError {
                            line: parsed.line,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        batch
    }
}

/// Parse a list body in the given dialect.
pub fn parse_list(text: &str, format: SourceFormat) -> ParseReport {
    let mut report = ParseReport::default();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') {
            report.skipped += 1;
            continue;
        }

        match format {
            SourceFormat::Domains => parse_domains_line(line, line_no, &mut report),
            SourceFormat::Hosts => parse_hosts_line(line, line_no, &mut report),
            SourceFormat::Adblock => parse_adblock_line(line, line_no, &mut report),
        }
    }

    report
}

/// Parse with a format given by name. Fails only if the name is unknown.
pub fn parse_declared(text: &str, declared: &str) -> Result<ParseReport, DomainError> {
    let format: SourceFormat = declared.parse()?;
    Ok(parse_list(text, format))
}

fn strip_inline_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => line[..idx].trim_end(),
        None => line,
    }
}

fn parse_domains_line(line: &str, line_no: usize, report: &mut ParseReport) {
    let line = strip_inline_comment(line);
    let mut tokens = line.split_whitespace();

    let Some(token) = tokens.next() else {
        report.skipped += 1;
        return;
    };
    if tokens.next().is_some() {
        report.malformed(line_no, "more than one token on a domain line");
        return;
    }

    match token.strip_prefix("*.") {
        Some(rest) => report.push(rest, EntryScope::Subdomains, line_no),
        None => report.push(token, EntryScope::Exact, line_no),
    }
}

fn parse_hosts_line(line: &str, line_no: usize, report: &mut ParseReport) {
    let line = strip_inline_comment(line);
    let mut tokens = line.split_whitespace();

    let Some(addr) = tokens.next() else {
        report.skipped += 1;
        return;
    };
    if addr.parse::<IpAddr>().is_err() {
        report.malformed(line_no, "hosts line does not start with an address");
        return;
    }

    let mut any = false;
    for name in tokens {
        any = true;
        if HOSTS_SELF_REFERENCES.contains(&name.to_ascii_lowercase().as_str()) {
            continue;
        }
        report.push(name, EntryScope::Exact, line_no);
    }

    if !any {
        report.malformed(line_no, "hosts line without a hostname");
    }
}

fn parse_adblock_line(line: &str, line_no: usize, report: &mut ParseReport) {
    if line.starts_with('!') || line.starts_with('[') {
        report.skipped += 1;
        return;
    }
    if line.starts_with("@@") {
        report.malformed(line_no, "exception rules are not supported");
        return;
    }
    if line.contains("##") || line.contains("#@#") || line.contains("#?#") {
        report.malformed(line_no, "cosmetic rules are not supported");
        return;
    }

    let Some(rest) = line.strip_prefix("||") else {
        report.malformed(line_no, "not a ||domain^ rule");
        return;
    };
    let Some(caret) = rest.find('^') else {
        report.malformed(line_no, "missing ^ separator");
        return;
    };

    let domain = &rest[..caret];
    let options = &rest[caret + 1..];
    if !(options.is_empty() || options == "|" || options == "$important") {
        report.malformed(line_no, "rule modifiers are not supported");
        return;
    }
    if domain.contains(['/', '*', ':']) {
        report.malformed(line_no, "rule is not a plain domain");
        return;
    }

    report.push(domain, EntryScope::Subdomains, line_no);
}
