//! API orchestration client
//!
//! Features:
//! - Base URL resolution and JSON (de)serialization
//! - Per-attempt timeouts with bounded linear-backoff retries
//! - Caller-driven cancellation
//! - One-shot sign-in redirect on rejected credentials
//! - Fire-and-forget analytics reporting

pub mod analytics;
pub mod api;
pub mod auth_guard;
pub mod retry;
pub mod transport;

pub use analytics::{AnalyticsEvent, AnalyticsReporter};
pub use api::{ApiClient, RequestOptions};
pub use auth_guard::AuthGuard;
pub use retry::{AttemptAborted, RetryPolicy};
pub use transport::{
    HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError,
};

use std::time::Duration;
use thiserror::Error;

/// Client errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Transient failures worth another attempt
    ///
    /// Timeouts, connection errors and 5xx responses are retried. A 4xx
    /// response is a deterministic client error and ends the loop on the
    /// first attempt, except 408 and 429 which are retried. A 401 never
    /// reaches here as a status: it becomes `Unauthorized` and is handed to
    /// the auth guard instead of being retried. Cancellation and decode
    /// failures are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Timeout(_) | ClientError::Network(_) => true,
            ClientError::Status { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            },
            _ => false,
        }
    }
}

impl From<AttemptAborted> for ClientError {
    fn from(aborted: AttemptAborted) -> Self {
        match aborted {
            AttemptAborted::TimedOut(after) => ClientError::Timeout(after),
            AttemptAborted::Cancelled => ClientError::Cancelled,
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => ClientError::Network("transport timed out".to_string()),
            TransportError::Connect(msg) | TransportError::Other(msg) => ClientError::Network(msg),
        }
    }
}

impl From<ClientError> for finlit_core::Error {
    fn from(err: ClientError) -> Self {
        finlit_core::Error::Client(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ClientError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(ClientError::Network("reset".into()).is_retryable());
        for status in [500, 502, 503, 408, 429] {
            assert!(ClientError::Status { status, body: String::new() }.is_retryable());
        }
        for status in [400, 403, 404, 422] {
            assert!(!ClientError::Status { status, body: String::new() }.is_retryable());
        }
        assert!(!ClientError::Unauthorized.is_retryable());
        assert!(!ClientError::Cancelled.is_retryable());
        assert!(!ClientError::InvalidResponse("bad json".into()).is_retryable());
    }

    #[test]
    fn test_converts_into_core_error() {
        let err: finlit_core::Error = ClientError::Unauthorized.into();
        assert!(matches!(err, finlit_core::Error::Client(_)));
    }
}
