use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};

/// Diagnostic routes, nested under `/api` by the server.
pub fn create_api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::get_status))
        .with_state(state)
}

/// Feed routes mounted at the configured `feed_path`: the full feed, its
/// parts, and the same pair per security level.
pub fn create_feed_routes(state: AppState, feed_path: &str) -> Router {
    let base = feed_path.trim_end_matches('/');
    Router::new()
        .route(base, get(handlers::get_feed))
        .route(&format!("{base}/parts/{{part}}"), get(handlers::get_feed_part))
        .route(&format!("{base}/levels/{{level}}"), get(handlers::get_level_feed))
        .route(
            &format!("{base}/levels/{{level}}/parts/{{part}}"),
            get(handlers::get_level_feed_part),
        )
        .with_state(state)
}
