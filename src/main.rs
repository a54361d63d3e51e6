//! Slow-drip server entry point.
//!
//! Accepts loopback connections, writes the response head immediately, then
//! delivers the body `"Hello World"` one character at a time with a fixed
//! pause between writes. Pair it with `naive-client` to watch a head-only
//! timeout fail to bound the transfer, or with `deadline-client` for the
//! corrected behavior.

use clap::Parser;
use std::path::PathBuf;

use slow_drip::config::{self, AppConfig, ConfigError};
use slow_drip::server::SlowServer;
use slow_drip::telemetry;

#[derive(Parser)]
#[command(name = "slow-drip")]
#[command(about = "HTTP server that trickles its response body one byte at a time", long_about = None)]
struct Args {
    /// Port to listen on (overrides the PORT environment variable).
    #[arg(short, long)]
    port: Option<u16>,

    /// Milliseconds to wait between body chunks.
    #[arg(long)]
    chunk_interval_ms: Option<u64>,

    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(port) = args.port.or_else(config::port_from_env) {
        config.server.port = port;
    }
    if let Some(interval) = args.chunk_interval_ms {
        config.server.chunk_interval_ms = interval;
    }
    config::validate_config(&config).map_err(ConfigError::Validation)?;

    let server = SlowServer::bind(&config.server).await?;
    server.run().await?;

    Ok(())
}
