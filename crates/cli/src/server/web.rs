use axum::Router;
use ferrous_feed_api::{create_api_routes, create_feed_routes, AppState};
use ferrous_feed_domain::Config;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn create_app(state: AppState, feed_path: &str) -> Router {
    create_feed_routes(state.clone(), feed_path)
        .nest("/api", create_api_routes(state))
        .layer(TraceLayer::new_for_http())
}

pub async fn start_web_server(
    config: &Config,
    state: AppState,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid bind address: {e}"))?;

    let app = create_app(state, &config.server.feed_path);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(
        addr = %addr,
        feed = %format!("http://{addr}{}", config.server.feed_path),
        "Feed server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Feed server stopped");
    Ok(())
}
