//! # Ferrous Feed
//!
//! Aggregates upstream blocklists into one deduplicated threat feed and
//! serves it over HTTP for firewalls that poll external domain lists.

mod bootstrap;
mod di;
mod server;

use clap::Parser;
use ferrous_feed_domain::CliOverrides;
use futures::future::join_all;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "ferrous-feed")]
#[command(version)]
#[command(about = "Blocklist aggregator and threat-feed publisher")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<String>,

    /// Bind address for the feed server
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Port for the feed server
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long)]
    log_level: Option<String>,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        bind_address: cli.bind,
        port: cli.port,
        log_level: cli.log_level,
    };
    let config = bootstrap::load_config(cli.config.as_deref(), overrides)?;

    if cli.check {
        println!(
            "Configuration OK: {} source(s), feed at {}",
            config.sources.len(),
            config.server.feed_path
        );
        return Ok(());
    }

    bootstrap::init_logging(&config);
    bootstrap::log_config(cli.config.as_deref(), &config);

    let shutdown = CancellationToken::new();
    let services = di::Services::build(&config, shutdown.clone())?;
    services.restore_snapshot().await;

    let state = services.app_state.clone();
    let handles = services.runner.start().await;

    tokio::spawn(wait_for_signal(shutdown.clone()));

    server::start_web_server(&config, state, shutdown.clone()).await?;

    shutdown.cancel();
    if tokio::time::timeout(SHUTDOWN_GRACE, join_all(handles))
        .await
        .is_err()
    {
        warn!("Background jobs did not stop within shutdown grace period");
    }

    info!("Ferrous Feed stopped");
    Ok(())
}

async fn wait_for_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("Shutdown signal received");
    shutdown.cancel();
}
