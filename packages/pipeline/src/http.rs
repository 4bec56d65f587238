use async_trait::async_trait;
use std::time::Duration;

use crate::error::PipelineError;

/// Provider quota-reset header, an epoch timestamp in seconds.
const RATE_LIMIT_RESET_HEADER: &str = "X-RateLimit-Reset";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One HTTP GET result, reduced to what the pipeline needs.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Provider-supplied quota reset time (epoch seconds), when present.
    pub rate_limit_reset: Option<i64>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for outbound GETs (to allow mocking).
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, PipelineError>;
}

/// reqwest-backed fetcher. Follows redirects (default policy) and bounds
/// each request with a 10s timeout.
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<HttpResponse, PipelineError> {
        let response = self
            .client
            .get(url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status().as_u16();
        // The provider sends the reset as a float; truncate to seconds.
        let rate_limit_reset = response
            .headers()
            .get(RATE_LIMIT_RESET_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<f64>().ok())
            .map(|value| value as i64);
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            rate_limit_reset,
            body,
        })
    }
}
