//! HTTP client plumbing shared by both client binaries.
//!
//! # Responsibilities
//! - Build the hyper client and issue the GET request
//! - Collect the full response body into memory
//! - Classify failures (transport, error status, body read, timeout)
//! - Log success and failure outcomes uniformly
//!
//! # Design Decisions
//! - `send_naive` applies its timeout to the response-head future only; body
//!   delivery is unbounded. That is the widespread mistake this crate
//!   demonstrates. `deadline::send_with_deadline` is the correct version.
//! - Non-2xx responses are surfaced as errors that carry the collected
//!   response, so callers can log status, headers, and body on failure

pub mod deadline;

use http_body_util::{BodyExt, Empty};
use hyper::body::{Bytes, Incoming};
use hyper::{HeaderMap, Method, Request, Response, StatusCode};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio::time;

pub use deadline::{send_with_deadline, CancelToken};

/// The client type used by every request in this crate.
pub type HttpClient = Client<HttpConnector, Empty<Bytes>>;

/// Build an HTTP client on the tokio executor.
pub fn build_client() -> HttpClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

/// Effective configuration of a request, logged as JSON after success.
#[derive(Debug, Clone, Serialize)]
pub struct RequestConfig {
    /// Target URL.
    pub url: String,

    /// Timeout in milliseconds; `None` issues the request unbounded.
    pub timeout_ms: Option<u64>,
}

impl RequestConfig {
    pub fn new(url: impl Into<String>, timeout_ms: Option<u64>) -> Self {
        Self {
            url: url.into(),
            timeout_ms,
        }
    }

    /// The configured timeout as a `Duration`.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// A response read to completion.
#[derive(Debug, Clone)]
pub struct CollectedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Error type for client requests.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The request could not be constructed.
    #[error("invalid request: {0}")]
    Request(#[from] hyper::http::Error),

    /// Connection or protocol failure before the response settled.
    #[error("transport error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    /// The response body stream failed mid-read.
    #[error("failed to read response body: {0}")]
    Body(#[from] hyper::Error),

    /// The server answered with an error status; the response is embedded.
    #[error("server responded with {}", .response.status)]
    Status { response: CollectedResponse },

    /// The configured timeout elapsed, by either mechanism.
    #[error("{message}")]
    Timeout { message: String },
}

fn build_request(config: &RequestConfig) -> Result<Request<Empty<Bytes>>, RequestError> {
    Request::builder()
        .method(Method::GET)
        .uri(config.url.as_str())
        .body(Empty::new())
        .map_err(RequestError::from)
}

async fn collect(response: Response<Incoming>) -> Result<CollectedResponse, RequestError> {
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await?.to_bytes();

    Ok(CollectedResponse {
        status: parts.status,
        headers: parts.headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

fn into_result(response: CollectedResponse) -> Result<CollectedResponse, RequestError> {
    if response.status.is_client_error() || response.status.is_server_error() {
        Err(RequestError::Status { response })
    } else {
        Ok(response)
    }
}

/// Issue the request and read the whole body, with no deadline of any kind.
pub async fn send(
    client: &HttpClient,
    config: &RequestConfig,
) -> Result<CollectedResponse, RequestError> {
    let request = build_request(config)?;
    let response = client.request(request).await?;
    into_result(collect(response).await?)
}

/// Issue the request with the timeout applied to the response head only.
///
/// Once headers arrive the timeout future is dropped, so a server that
/// flushes its head promptly and then trickles the body holds the call open
/// arbitrarily long past the configured value.
pub async fn send_naive(
    client: &HttpClient,
    config: &RequestConfig,
) -> Result<CollectedResponse, RequestError> {
    let Some(timeout) = config.timeout() else {
        return send(client, config).await;
    };

    let request = build_request(config)?;
    let response = match time::timeout(timeout, client.request(request)).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(RequestError::Timeout {
                message: format!(
                    "timed out after {}ms waiting for response headers",
                    timeout.as_millis()
                ),
            });
        }
    };

    into_result(collect(response).await?)
}

/// Log the settled request the same way for both client binaries: response
/// detail on success, the error chain (plus any embedded response) on
/// failure.
pub fn log_outcome(config: &RequestConfig, outcome: &Result<CollectedResponse, RequestError>) {
    match outcome {
        Ok(response) => {
            tracing::debug!(
                status = %response.status,
                headers = ?response.headers,
                "got response"
            );
            tracing::debug!(body = %response.body);
            match serde_json::to_string(config) {
                Ok(json) => tracing::debug!("request configuration: {json}"),
                Err(error) => tracing::debug!(%error, "failed to serialize request configuration"),
            }
        }
        Err(error) => {
            tracing::debug!(%error, "request failed");
            let mut source = std::error::Error::source(error);
            while let Some(cause) = source {
                tracing::debug!(%cause, "caused by");
                source = cause.source();
            }
            if let RequestError::Status { response } = error {
                tracing::debug!(
                    status = %response.status,
                    headers = ?response.headers,
                    "got response"
                );
                tracing::debug!(body = %response.body);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_error_displays_its_plain_message() {
        let error = RequestError::Timeout {
            message: "timeout of 1000ms exceeded".into(),
        };
        assert_eq!(error.to_string(), "timeout of 1000ms exceeded");
    }

    #[test]
    fn request_config_serializes_timeout_in_millis() {
        let config = RequestConfig::new("http://127.0.0.1:8080", Some(1000));
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"url":"http://127.0.0.1:8080","timeout_ms":1000}"#);
    }

    #[test]
    fn request_config_converts_timeout_to_duration() {
        let bounded = RequestConfig::new("http://127.0.0.1:8080", Some(250));
        assert_eq!(bounded.timeout(), Some(Duration::from_millis(250)));

        let unbounded = RequestConfig::new("http://127.0.0.1:8080", None);
        assert_eq!(unbounded.timeout(), None);
    }
}
