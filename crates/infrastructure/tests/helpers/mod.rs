#![allow(dead_code)]

use bytes::Bytes;
use chrono::Utc;
use ferrous_feed_domain::config::LimitsConfig;
use ferrous_feed_domain::{FeedGeneration, LevelFeed, Source, SourceFormat};
use std::time::Duration;

/// Limits tuned for tests: fast retries, short timeout, small body ceiling.
pub fn test_limits() -> LimitsConfig {
    LimitsConfig {
        max_body_bytes: 1024,
        fetch_timeout_secs: 1,
        max_retries: 2,
        retry_base_delay_ms: 10,
        ..LimitsConfig::default()
    }
}

pub fn source_at(url: String) -> Source {
    Source::new(
        "test",
        url,
        SourceFormat::Domains,
        Duration::from_secs(3600),
        true,
    )
}

pub fn generation(number: u64, parts: &[&str]) -> FeedGeneration {
    let body = Bytes::from(parts.concat());
    FeedGeneration {
        generation: number,
        built_at: Utc::now(),
        etag: FeedGeneration::compute_etag(number, &body),
        parts: parts.iter().map(|p| Bytes::from(p.to_string())).collect(),
        domain_count: body.iter().filter(|b| **b == b'\n').count(),
        dropped_entries: 0,
        base_level: 0,
        levels: Vec::new(),
        body,
    }
}

pub fn level(level: u32, parts: &[&str]) -> LevelFeed {
    let body = Bytes::from(parts.concat());
    LevelFeed {
        level,
        parts: parts.iter().map(|p| Bytes::from(p.to_string())).collect(),
        domain_count: body.iter().filter(|b| **b == b'\n').count(),
        dropped_entries: 0,
        body,
    }
}
