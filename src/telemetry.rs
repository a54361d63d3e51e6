//! Logging setup and elapsed-time measurement.
//!
//! # Responsibilities
//! - Install the process-wide tracing subscriber
//! - Convert monotonic clock deltas to fractional milliseconds for the
//!   elapsed-time log lines all three binaries emit

use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Debug output for all three entry points is on by default; `RUST_LOG`
/// still takes precedence when set.
pub fn init() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "slow_drip=debug,naive_client=debug,deadline_client=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Milliseconds elapsed since `started`, derived from the monotonic clock.
///
/// Fractional so sub-millisecond scheduling differences stay visible in the
/// logs.
pub fn elapsed_millis(started: Instant) -> f64 {
    let elapsed = started.elapsed();
    elapsed.as_secs() as f64 * 1e3 + f64::from(elapsed.subsec_nanos()) / 1e6
}
