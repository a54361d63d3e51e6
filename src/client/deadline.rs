//! Deadline enforcement independent of the HTTP stack's own timeout
//! handling.
//!
//! # Design Decisions
//! - The deadline races the entire exchange, head and body, not just the
//!   wait for headers
//! - The cancellation token fires at most once; the arming timer is aborted
//!   on every completion path so it can never cancel a settled request
//! - A cancelled request surfaces as a plain timeout error carrying the
//!   timer's message, so callers never see cancellation internals

use std::sync::{Arc, OnceLock};
use tokio::sync::Notify;
use tokio::time;

use super::{send, CollectedResponse, HttpClient, RequestConfig, RequestError};

/// One-shot cancellation signal shared between a request and its timer.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    reason: OnceLock<String>,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger cancellation. The first call wins; later calls are no-ops.
    pub fn cancel(&self, reason: impl Into<String>) {
        if self.inner.reason.set(reason.into()).is_ok() {
            self.inner.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.reason.get().is_some()
    }

    /// The reason passed to the winning `cancel` call, if any.
    pub fn reason(&self) -> Option<&str> {
        self.inner.reason.get().map(String::as_str)
    }

    /// Wait until the token is cancelled; resolves to the cancel reason.
    pub async fn cancelled(&self) -> &str {
        loop {
            // Register interest before checking, so a cancel landing between
            // the check and the await still wakes us.
            let notified = self.inner.notify.notified();
            if let Some(reason) = self.inner.reason.get() {
                return reason;
            }
            notified.await;
        }
    }
}

/// Issue the request with a hard deadline covering the entire exchange.
///
/// With a timeout configured, a [`CancelToken`] is armed by a timer task for
/// that duration and raced against the request; losing the race aborts the
/// in-flight request and yields [`RequestError::Timeout`] with the message
/// `"timeout of <N>ms exceeded"`. The timer is aborted once the request
/// settles by any path. Without a timeout the request passes straight
/// through with no cancellation wiring.
pub async fn send_with_deadline(
    client: &HttpClient,
    config: &RequestConfig,
) -> Result<CollectedResponse, RequestError> {
    let Some(timeout) = config.timeout() else {
        return send(client, config).await;
    };

    let token = CancelToken::new();
    let timer = tokio::spawn({
        let token = token.clone();
        async move {
            time::sleep(timeout).await;
            token.cancel(format!("timeout of {}ms exceeded", timeout.as_millis()));
        }
    });

    let result = tokio::select! {
        result = send(client, config) => result,
        reason = token.cancelled() => Err(RequestError::Timeout {
            message: reason.to_string(),
        }),
    };

    timer.abort();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn first_cancel_reason_wins() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert_eq!(token.reason(), None);

        token.cancel("first");
        token.cancel("second");

        assert!(token.is_cancelled());
        assert_eq!(token.reason(), Some("first"));
        assert_eq!(token.cancelled().await, "first");
    }

    #[tokio::test]
    async fn cancel_wakes_a_pending_waiter() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await.to_string() });

        time::sleep(Duration::from_millis(20)).await;
        token.cancel("stop");

        assert_eq!(handle.await.unwrap(), "stop");
    }
}
