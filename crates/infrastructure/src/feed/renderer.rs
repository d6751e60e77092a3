use bytes::Bytes;
use ferrous_feed_domain::config::FeedFormat;
use ferrous_feed_domain::{CanonicalSet, DomainEntry, DomainError, EntryScope};
use tracing::debug;

/// Text output of one render pass, before it becomes a `FeedGeneration`.
#[derive(Debug, Clone)]
pub struct RenderedFeed {
    pub body: Bytes,
    /// Zero-copy slices of `body`, each ending on a line boundary.
    pub parts: Vec<Bytes>,
    pub lines: usize,
    pub dropped: usize,
}

/// Turns a canonical set into newline-delimited feed text.
#[derive(Debug, Clone, Copy)]
pub struct FeedRenderer {
    format: FeedFormat,
    max_lines_per_part: usize,
}

impl FeedRenderer {
    pub fn new(format: FeedFormat, max_lines_per_part: usize) -> Self {
        Self {
            format,
            max_lines_per_part: max_lines_per_part.max(1),
        }
    }

    pub fn format(&self) -> FeedFormat {
        self.format
    }

    pub fn render(&self, set: &CanonicalSet) -> RenderedFeed {
        let mut text = String::with_capacity(set.len() * 24);
        // Byte offset just past each line's newline.
        let mut line_ends: Vec<usize> = Vec::with_capacity(set.len());
        let mut dropped = 0;

        for entry in set.entries() {
            if let Err(e) = check_representable(entry) {
                debug!(domain = %entry.domain, source = %entry.source, error = %e, "Dropping unrenderable entry");
                dropped += 1;
                continue;
            }
            self.write_entry(entry, &mut text, &mut line_ends);
        }

        let body = Bytes::from(text);
        let parts = split_balanced(&body, &line_ends, self.max_lines_per_part);

        RenderedFeed {
            body,
            parts,
            lines: line_ends.len(),
            dropped,
        }
    }

    fn write_entry(&self, entry: &DomainEntry, text: &mut String, line_ends: &mut Vec<usize>) {
        let domain = entry.domain.as_str();
        let mut line = |prefix: &str, name: &str| {
            text.push_str(prefix);
            text.push_str(name);
            text.push('\n');
            line_ends.push(text.len());
        };

        match self.format {
            FeedFormat::Domains => line("", domain),
            FeedFormat::Hosts => line("0.0.0.0 ", domain),
            FeedFormat::Wildcard => {
                line("", domain);
                if entry.scope == EntryScope::Subdomains {
                    line("*.", domain);
                }
            }
        }
    }
}

fn check_representable(entry: &DomainEntry) -> Result<(), DomainError> {
    let domain = entry.domain.as_str();
    if domain.is_empty() {
        return Err(DomainError::RenderError("empty domain".to_string()));
    }
    if !domain.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(DomainError::RenderError(format!(
            "{domain:?} contains non-ASCII, whitespace or control characters"
        )));
    }
    Ok(())
}

/// Split into the fewest parts of at most `max_lines` lines, spreading lines
/// evenly: the first `lines % parts` parts carry one extra line.
fn split_balanced(body: &Bytes, line_ends: &[usize], max_lines: usize) -> Vec<Bytes> {
    let lines = line_ends.len();
    if lines == 0 {
        return vec![body.clone()];
    }

    let part_count = lines.div_ceil(max_lines);
    let base = lines / part_count;
    let extra = lines % part_count;

    let mut parts = Vec::with_capacity(part_count);
    let mut start_byte = 0;
    let mut consumed = 0;
    for i in 0..part_count {
        let take = base + usize::from(i < extra);
        consumed += take;
        let end_byte = line_ends[consumed - 1];
        parts.push(body.slice(start_byte..end_byte));
        start_byte = end_byte;
    }
    parts
}
