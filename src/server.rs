//! Slow-drip HTTP server.
//!
//! # Responsibilities
//! - Bind to the configured loopback port and accept connections
//! - Write the response head immediately, then deliver the body one
//!   character at a time with a fixed pause between writes
//! - Log elapsed time when each connection closes
//!
//! # Design Decisions
//! - Raw TCP rather than an HTTP framework: the point is byte-level control
//!   over when each body chunk hits the wire
//! - Chunk writes are strictly sequential; the next write is not scheduled
//!   until the previous one completed and the interval elapsed
//! - A failed chunk write aborts that response's send loop silently; only
//!   bind failures are fatal

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time;

use crate::config::ServerConfig;
use crate::telemetry;

/// The fixed response body, delivered one character per write.
pub const RESPONSE_BODY: &str = "Hello World";

/// Upper bound on the request head we are willing to buffer.
const MAX_HEAD_BYTES: usize = 8 * 1024;

/// Error type for server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind: {0}")]
    Bind(#[source] std::io::Error),
    #[error("failed to accept: {0}")]
    Accept(#[source] std::io::Error),
}

/// HTTP server that trickles its response body.
pub struct SlowServer {
    listener: TcpListener,
    chunk_interval: Duration,
}

impl SlowServer {
    /// Bind to the configured port on loopback and log the bound address.
    pub async fn bind(config: &ServerConfig) -> Result<Self, ServerError> {
        let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
        let listener = TcpListener::bind(addr).await.map_err(ServerError::Bind)?;
        let local_addr = listener.local_addr().map_err(ServerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            chunk_interval_ms = config.chunk_interval_ms,
            "server is listening"
        );

        Ok(Self {
            listener,
            chunk_interval: Duration::from_millis(config.chunk_interval_ms),
        })
    }

    /// Get the local address this server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    async fn accept(&self) -> Result<(TcpStream, SocketAddr), ServerError> {
        self.listener.accept().await.map_err(ServerError::Accept)
    }

    /// Accept connections forever, serving each on its own task.
    ///
    /// Accept errors are logged and the loop continues; only bind failures
    /// are fatal.
    pub async fn run(self) -> Result<(), ServerError> {
        loop {
            match self.accept().await {
                Ok((stream, peer)) => {
                    tracing::debug!(peer = %peer, "connection accepted");
                    tokio::spawn(handle_connection(stream, peer, self.chunk_interval));
                }
                Err(error) => {
                    tracing::warn!(%error, "failed to accept connection");
                }
            }
        }
    }
}

/// Serve one connection: read the request head, respond head-first, then
/// drip the body.
async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, interval: Duration) {
    let received_at = Instant::now();

    if !read_request_head(&mut stream).await {
        return;
    }
    tracing::debug!(peer = %peer, "got request");

    // Response head goes out before any body byte.
    let head = response_head(RESPONSE_BODY.len());
    if let Err(error) = stream.write_all(head.as_bytes()).await {
        tracing::debug!(%error, "failed to write response head");
        return;
    }
    if let Err(error) = stream.flush().await {
        tracing::debug!(%error, "failed to flush response head");
        return;
    }
    tracing::debug!("wrote response head");

    let mut chunks: VecDeque<char> = RESPONSE_BODY.chars().collect();
    let mut encode_buf = [0u8; 4];
    while let Some(chunk) = chunks.pop_front() {
        if let Err(error) = stream
            .write_all(chunk.encode_utf8(&mut encode_buf).as_bytes())
            .await
        {
            // No retry; the connection is left to close below.
            tracing::debug!(%error, "failed to write chunk");
            break;
        }
        tracing::debug!(%chunk, "wrote chunk");

        // The next write is delayed from completion of this one. An empty
        // queue ends the response without a trailing pause.
        if !chunks.is_empty() {
            time::sleep(interval).await;
        }
    }

    let _ = stream.shutdown().await;
    tracing::debug!(
        peer = %peer,
        "socket closed, took {:.3}ms",
        telemetry::elapsed_millis(received_at)
    );
}

/// Read until the end of the request head. Returns `false` if the peer went
/// away or the head is oversized; such connections are dropped silently.
async fn read_request_head(stream: &mut TcpStream) -> bool {
    let mut head = Vec::with_capacity(512);
    let mut buf = [0u8; 1024];

    loop {
        match stream.read(&mut buf).await {
            Ok(0) => return false,
            Ok(n) => {
                head.extend_from_slice(&buf[..n]);
                if head.windows(4).any(|window| window == b"\r\n\r\n") {
                    return true;
                }
                if head.len() > MAX_HEAD_BYTES {
                    return false;
                }
            }
            Err(_) => return false,
        }
    }
}

fn response_head(content_length: usize) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=UTF-8\r\nContent-Length: {content_length}\r\n\r\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_head_pins_status_and_headers() {
        let head = response_head(RESPONSE_BODY.len());
        assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(head.contains("Content-Type: text/plain; charset=UTF-8\r\n"));
        assert!(head.contains("Content-Length: 11\r\n"));
        assert!(head.ends_with("\r\n\r\n"));
    }
}
