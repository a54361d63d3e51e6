//! Shared utilities for integration testing.

use std::net::SocketAddr;

use slow_drip::config::ServerConfig;
use slow_drip::server::SlowServer;

/// Bind a slow server on an ephemeral loopback port with the given chunk
/// interval and run it in the background. Returns the bound address.
pub async fn start_slow_server(chunk_interval_ms: u64) -> SocketAddr {
    let config = ServerConfig {
        port: 0,
        chunk_interval_ms,
    };
    let server = SlowServer::bind(&config).await.expect("bind slow server");
    let addr = server.local_addr().expect("local addr");

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    addr
}
