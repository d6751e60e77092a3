use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use ferrous_feed_domain::FeedGeneration;
use tracing::{debug, instrument};

const RETRY_AFTER_SECS: &str = "30";
const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

#[instrument(skip(state, headers), name = "api_get_feed")]
pub async fn get_feed(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(feed) = state.get_feed.execute() else {
        return not_ready();
    };
    respond(&headers, &feed, feed.etag.clone(), feed.body.clone(), feed.domain_count)
}

#[instrument(skip(state, headers), name = "api_get_feed_part")]
pub async fn get_feed_part(
    State(state): State<AppState>,
    Path(part): Path<usize>,
    headers: HeaderMap,
) -> Response {
    let Some(feed) = state.get_feed.execute() else {
        return not_ready();
    };
    // Parts are numbered from 1 on the wire.
    let Some(body) = part.checked_sub(1).and_then(|i| feed.part(i)) else {
        debug!(part, parts = feed.part_count(), "Unknown feed part requested");
        return StatusCode::NOT_FOUND.into_response();
    };
    respond(
        &headers,
        &feed,
        part_etag(&feed.etag, part),
        body.clone(),
        feed.domain_count,
    )
}

#[instrument(skip(state, headers), name = "api_get_level_feed")]
pub async fn get_level_feed(
    State(state): State<AppState>,
    Path(level): Path<u32>,
    headers: HeaderMap,
) -> Response {
    let Some(feed) = state.get_feed.execute() else {
        return not_ready();
    };
    let Some(tier) = feed.level(level) else {
        debug!(level, levels = ?feed.level_numbers(), "Unknown security level requested");
        return StatusCode::NOT_FOUND.into_response();
    };
    respond(
        &headers,
        &feed,
        level_etag(&feed.etag, level),
        tier.body,
        tier.domain_count,
    )
}

#[instrument(skip(state, headers), name = "api_get_level_feed_part")]
pub async fn get_level_feed_part(
    State(state): State<AppState>,
    Path((level, part)): Path<(u32, usize)>,
    headers: HeaderMap,
) -> Response {
    let Some(feed) = state.get_feed.execute() else {
        return not_ready();
    };
    let Some(tier) = feed.level(level) else {
        debug!(level, levels = ?feed.level_numbers(), "Unknown security level requested");
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(body) = part.checked_sub(1).and_then(|i| tier.part(i)) else {
        debug!(level, part, parts = tier.part_count(), "Unknown feed part requested");
        return StatusCode::NOT_FOUND.into_response();
    };
    respond(
        &headers,
        &feed,
        part_etag(&level_etag(&feed.etag, level), part),
        body.clone(),
        tier.domain_count,
    )
}

fn not_ready() -> Response {
    debug!("Feed requested before first generation");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        [(header::RETRY_AFTER, RETRY_AFTER_SECS)],
        "feed not yet available\n",
    )
        .into_response()
}

fn respond(
    request: &HeaderMap,
    feed: &FeedGeneration,
    etag: String,
    body: Bytes,
    domains: usize,
) -> Response {
    let mut headers = HeaderMap::new();
    insert(&mut headers, header::ETAG, &etag);
    insert(
        &mut headers,
        header::LAST_MODIFIED,
        &feed.built_at.format(HTTP_DATE).to_string(),
    );
    insert(&mut headers, header::CACHE_CONTROL, "no-cache");
    headers.insert("x-feed-generation", HeaderValue::from(feed.generation));
    headers.insert("x-feed-domains", HeaderValue::from(domains));

    if not_modified(request, &etag, feed.built_at) {
        return (StatusCode::NOT_MODIFIED, headers).into_response();
    }

    insert(&mut headers, header::CONTENT_TYPE, "text/plain; charset=utf-8");
    (StatusCode::OK, headers, body).into_response()
}

fn insert(headers: &mut HeaderMap, name: header::HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

/// `If-None-Match` wins over `If-Modified-Since` when both are present.
fn not_modified(request: &HeaderMap, etag: &str, built_at: DateTime<Utc>) -> bool {
    if let Some(candidates) = request
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
    {
        return candidates.split(',').map(str::trim).any(|candidate| {
            candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
        });
    }

    request
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
        .is_some_and(|since| built_at.timestamp() <= since.timestamp())
}

fn part_etag(etag: &str, part: usize) -> String {
    let inner = etag.trim_matches('"');
    format!("\"{inner}-p{part}\"")
}

fn level_etag(etag: &str, level: u32) -> String {
    let inner = etag.trim_matches('"');
    format!("\"{inner}-l{level}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_if_none_match_variants() {
        let built = Utc::now();
        let etag = "\"3-abcd\"";
        assert!(not_modified(&request(header::IF_NONE_MATCH, etag), etag, built));
        assert!(not_modified(&request(header::IF_NONE_MATCH, "W/\"3-abcd\""), etag, built));
        assert!(not_modified(&request(header::IF_NONE_MATCH, "\"x\", \"3-abcd\""), etag, built));
        assert!(not_modified(&request(header::IF_NONE_MATCH, "*"), etag, built));
        assert!(!not_modified(&request(header::IF_NONE_MATCH, "\"2-abcd\""), etag, built));
    }

    #[test]
    fn test_if_modified_since() {
        let built = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let etag = "\"1-x\"";
        let same = request(header::IF_MODIFIED_SINCE, "Fri, 01 Mar 2024 12:00:00 GMT");
        let older = request(header::IF_MODIFIED_SINCE, "Fri, 01 Mar 2024 11:59:59 GMT");
        let garbage = request(header::IF_MODIFIED_SINCE, "yesterday");

        assert!(not_modified(&same, etag, built));
        assert!(!not_modified(&older, etag, built));
        assert!(!not_modified(&garbage, etag, built));
    }

    #[test]
    fn test_if_none_match_takes_precedence() {
        let built = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut headers = request(header::IF_NONE_MATCH, "\"old\"");
        headers.insert(
            header::IF_MODIFIED_SINCE,
            HeaderValue::from_static("Sat, 02 Mar 2024 00:00:00 GMT"),
        );
        assert!(!not_modified(&headers, "\"new\"", built));
    }

    #[test]
    fn test_part_etag_is_distinct_per_part() {
        assert_eq!(part_etag("\"7-abc\"", 2), "\"7-abc-p2\"");
        assert_ne!(part_etag("\"7-abc\"", 1), part_etag("\"7-abc\"", 2));
    }

    #[test]
    fn test_level_etags_nest() {
        let level = level_etag("\"7-abc\"", 3);
        assert_eq!(level, "\"7-abc-l3\"");
        assert_eq!(part_etag(&level, 1), "\"7-abc-l3-p1\"");
    }
}
