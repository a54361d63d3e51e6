//! Reproduction of a timeout defect in HTTP client plumbing.
//!
//! A server trickles an 11-byte body one character every 400ms, so the
//! response head arrives at once but the full response takes ~4s. The naive
//! client bounds only the wait for the head and sails past its configured
//! timeout; the deadline client races an explicit one-shot cancellation
//! timer against the whole exchange and aborts on time.

pub mod client;
pub mod config;
pub mod server;
pub mod telemetry;

pub use client::{HttpClient, RequestConfig};
pub use server::SlowServer;
