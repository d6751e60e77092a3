use ferrous_feed_domain::{CliOverrides, Config};
use tracing::info;

pub fn load_config(
    config_path: Option<&str>,
    cli_overrides: CliOverrides,
) -> anyhow::Result<Config> {
    let config = Config::load(config_path, cli_overrides)?;
    config.validate()?;
    Ok(config)
}

/// Logged after `init_logging`, which needs the loaded level.
pub fn log_config(config_path: Option<&str>, config: &Config) {
    info!(
        config_file = config_path.unwrap_or("default"),
        bind = %config.server.bind_address,
        port = config.server.port,
        feed_path = %config.server.feed_path,
        format = ?config.feed.format,
        sources = config.sources.len(),
        allow_entries = config.feed.allow.len(),
        "Configuration loaded"
    );
    for source in &config.sources {
        info!(
            source = %source.name,
            url = %source.url,
            format = source.format.as_str(),
            refresh_interval_secs = source.refresh_interval_secs,
            degrade_gracefully = source.degrade_gracefully,
            security_level = source.security_level,
            "Source configured"
        );
    }
}
