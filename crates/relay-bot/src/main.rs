//! Signed alert relay - Entry Point

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Relay trading alerts to the exchange as signed orders
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via RELAY_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    relay_telemetry::init_logging()?;

    info!("Starting alert relay v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > RELAY_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("RELAY_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");

    let config = relay_bot::AppConfig::from_file(&config_path)?;
    info!(
        listen_addr = %config.server.listen_addr,
        base_url = %config.exchange.base_url,
        auth_mode = ?config.auth.mode,
        "Configuration loaded"
    );

    let app = relay_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}
