//! API clients over [`HttpFetch`].
//!
//! [`JsonClient`] is the plain GET-and-decode client for endpoints whose
//! credentials are already embedded in the URL. [`RateLimitedClient`]
//! signs each request with a rotated credential pair and absorbs the
//! venue provider's quota rejections.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::credentials::{Credential, CredentialRotator};
use crate::error::PipelineError;
use crate::http::HttpFetch;

/// The status the venue provider uses for quota rejections.
const RATE_LIMIT_STATUS: u16 = 403;

/// Plain JSON client: GET, then decode the UTF-8 body as JSON.
pub struct JsonClient {
    fetcher: Arc<dyn HttpFetch>,
}

impl JsonClient {
    pub fn new(fetcher: Arc<dyn HttpFetch>) -> Self {
        Self { fetcher }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, PipelineError> {
        let response = self.fetcher.get(url).await?;
        if !response.is_success() {
            return Err(PipelineError::Transport {
                status: response.status,
                url: url.to_string(),
            });
        }
        Ok(serde_json::from_str(&response.body)?)
    }
}

/// What to do when a request is rejected for quota inside a fresh window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitPolicy {
    /// Retry immediately with the next rotated credential; sleep only
    /// when every credential sits inside an active window.
    RotateCredential,
    /// Sleep until this credential's reset elapses, then retry it.
    SleepAndRetry,
}

/// Client for the venue provider: appends a rotated credential pair and
/// the API version to each request, tracks per-credential quota windows,
/// and retries rate-limit rejections per the configured policy.
///
/// A rejection that arrives after the credential's recorded reset has
/// already passed is surfaced as [`PipelineError::RateLimitViolation`] —
/// the provider broke its own contract and blind retries would mask a
/// real outage.
pub struct RateLimitedClient {
    fetcher: Arc<dyn HttpFetch>,
    rotator: CredentialRotator,
    policy: RateLimitPolicy,
    api_version: String,
    windows: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl RateLimitedClient {
    pub fn new(
        fetcher: Arc<dyn HttpFetch>,
        rotator: CredentialRotator,
        policy: RateLimitPolicy,
        api_version: &str,
    ) -> Self {
        Self {
            fetcher,
            rotator,
            policy,
            api_version: api_version.to_string(),
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, PipelineError> {
        let mut credential = self.rotator.next();
        loop {
            let signed = self.signed_url(url, &credential);
            let response = self.fetcher.get(&signed).await?;

            if response.is_success() {
                self.clear_window(&credential);
                return Ok(serde_json::from_str(&response.body)?);
            }

            if response.status != RATE_LIMIT_STATUS {
                return Err(PipelineError::Transport {
                    status: response.status,
                    url: url.to_string(),
                });
            }

            let Some(reset_epoch) = response.rate_limit_reset else {
                // A quota rejection without a reset time is indistinguishable
                // from a plain denial.
                return Err(PipelineError::Transport {
                    status: response.status,
                    url: url.to_string(),
                });
            };
            let reset = self.record_window(&credential, reset_epoch)?;

            match self.policy {
                RateLimitPolicy::SleepAndRetry => {
                    warn!(
                        client_id = %credential.client_id,
                        %reset,
                        "rate limited; sleeping until quota resets"
                    );
                    sleep_until(reset).await;
                }
                RateLimitPolicy::RotateCredential => {
                    if let Some(earliest) = self.all_limited_until() {
                        warn!(
                            %earliest,
                            "every credential is rate limited; sleeping until the earliest reset"
                        );
                        sleep_until(earliest).await;
                    } else {
                        debug!(
                            client_id = %credential.client_id,
                            "rate limited; rotating to the next credential"
                        );
                    }
                    credential = self.rotator.next();
                }
            }
        }
    }

    fn signed_url(&self, url: &str, credential: &Credential) -> String {
        let separator = if url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}client_id={}&client_secret={}&v={}",
            url, separator, credential.client_id, credential.client_secret, self.api_version
        )
    }

    /// Record a fresh quota window for this credential. Fails when the
    /// previously recorded window has already elapsed: the provider
    /// rejected a request that should have been back within quota.
    fn record_window(
        &self,
        credential: &Credential,
        reset_epoch: i64,
    ) -> Result<DateTime<Utc>, PipelineError> {
        let reset = DateTime::from_timestamp(reset_epoch, 0).unwrap_or_else(Utc::now);
        let now = Utc::now();
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(previous) = windows.get(&credential.client_id) {
            if *previous <= now {
                return Err(PipelineError::RateLimitViolation {
                    client_id: credential.client_id.clone(),
                    reset: *previous,
                });
            }
        }
        windows.insert(credential.client_id.clone(), reset);
        Ok(reset)
    }

    /// Forget the window once the credential serves a request again, so a
    /// later rejection opens a fresh window instead of tripping the
    /// violation check.
    fn clear_window(&self, credential: &Credential) {
        self.windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&credential.client_id);
    }

    /// When every credential sits inside an active window, returns the
    /// earliest reset among them.
    fn all_limited_until(&self) -> Option<DateTime<Utc>> {
        let now = Utc::now();
        let windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if windows.len() < self.rotator.len() {
            return None;
        }
        if windows.values().any(|reset| *reset <= now) {
            return None;
        }
        windows.values().min().copied()
    }
}

async fn sleep_until(deadline: DateTime<Utc>) {
    let wait = (deadline - Utc::now()).to_std().unwrap_or_default();
    tokio::time::sleep(wait).await;
}
