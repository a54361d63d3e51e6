//! Client that passes its timeout to the response-head future only.
//!
//! Against the slow-drip server the head arrives well inside the timeout,
//! so the timeout never fires and the call runs for the full body-delivery
//! duration. The elapsed-time log line at the end makes the overshoot
//! visible.

use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

use slow_drip::client::{self, RequestConfig};
use slow_drip::config::{self, AppConfig};
use slow_drip::telemetry;

#[derive(Parser)]
#[command(name = "naive-client")]
#[command(about = "GET with a timeout that only bounds time-to-first-byte", long_about = None)]
struct Args {
    /// Target port (overrides the PORT environment variable).
    #[arg(short, long)]
    port: Option<u16>,

    /// Request timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Issue the request with no timeout at all.
    #[arg(long)]
    no_timeout: bool,

    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    telemetry::init();
    let args = Args::parse();

    let app = match &args.config {
        Some(path) => match config::load_config(path) {
            Ok(app) => app,
            Err(error) => {
                tracing::error!(%error, "failed to load configuration");
                return;
            }
        },
        None => AppConfig::default(),
    };

    let port = args
        .port
        .or_else(config::port_from_env)
        .unwrap_or(app.server.port);
    let timeout_ms = if args.no_timeout {
        None
    } else {
        args.timeout_ms.or(app.client.timeout_ms)
    };
    let request = RequestConfig::new(format!("http://127.0.0.1:{port}"), timeout_ms);

    match request.timeout_ms {
        Some(ms) => tracing::debug!("requesting (configured timeout: {ms}ms)"),
        None => tracing::debug!("requesting (no timeout configured)"),
    }

    let requested_at = Instant::now();
    let client = client::build_client();
    let outcome = client::send_naive(&client, &request).await;

    client::log_outcome(&request, &outcome);
    tracing::debug!("took {:.3}ms", telemetry::elapsed_millis(requested_at));
}
