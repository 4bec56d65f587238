use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced by pipeline components.
///
/// The harness never catches these per-message; it classifies them via
/// [`PipelineError::failure_kind`] and either retries in-process or lets
/// the error end the worker so the broker redelivers the message.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Provider returned a non-success status that is not a recognized
    /// rate limit. Never retried.
    #[error("provider returned HTTP {status} for {url}")]
    Transport { status: u16, url: String },

    /// Response body or message payload was not valid JSON.
    #[error("failed to decode JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// Connection-level HTTP failure (DNS, TLS, timeout).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider rejected a request for a credential whose recorded quota
    /// reset had already passed. The provider's rate-limit contract was
    /// violated; retrying would loop forever against a real outage.
    #[error("rate limit window violated for client {client_id}: reset {reset} already elapsed")]
    RateLimitViolation {
        client_id: String,
        reset: DateTime<Utc>,
    },

    /// Message payload did not match the stage's contract.
    #[error("malformed message payload: {0}")]
    Payload(String),

    /// Broker confirmed deletion of a different message than requested.
    #[error("acknowledged message {confirmed} but expected {expected}")]
    AckMismatch { expected: String, confirmed: String },

    /// Database failure.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Broker failure.
    #[error("queue error: {0}")]
    Queue(String),
}

/// Whether a failure may be retried in-process before the worker dies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Retryable,
    Fatal,
}

impl PipelineError {
    /// Classify this failure for the harness retry policy.
    ///
    /// Only transient connection trouble is retryable; everything else
    /// (bad payloads, provider rejections, broker protocol violations)
    /// terminates the process and leaves redelivery to the broker.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            PipelineError::Http(err) if err.is_connect() || err.is_timeout() => {
                FailureKind::Retryable
            }
            PipelineError::Storage(
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_),
            ) => FailureKind::Retryable,
            _ => FailureKind::Fatal,
        }
    }
}
