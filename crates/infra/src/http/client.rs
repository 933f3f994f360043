use std::time::Duration;

use cadence_domain::CadenceError;
use reqwest::{Client as ReqwestClient, Method, Request, RequestBuilder, Response};
use tracing::{debug, warn};

use crate::errors::InfraError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_ATTEMPTS: usize = 3;
const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(200);
const MAX_BACKOFF_DOUBLINGS: u32 = 6;

/// Exponential backoff between attempts of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RetryPolicy {
    max_attempts: usize,
    base_backoff: Duration,
}

impl RetryPolicy {
    /// Delay before attempt `next_attempt` (1-based, so the first retry is 2).
    fn delay_before(&self, next_attempt: usize) -> Duration {
        let doublings = u32::try_from(next_attempt.saturating_sub(2))
            .unwrap_or(MAX_BACKOFF_DOUBLINGS)
            .min(MAX_BACKOFF_DOUBLINGS);
        self.base_backoff.saturating_mul(1 << doublings)
    }

    fn has_attempts_after(&self, attempt: usize) -> bool {
        attempt < self.max_attempts
    }
}

/// Thin wrapper over `reqwest` that retries transient failures.
///
/// Only server errors and transport failures (connect, timeout) are retried.
/// Every other response goes back to the caller untouched so status mapping
/// stays with the remote client.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    policy: RetryPolicy,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn new() -> Result<Self, CadenceError> {
        Self::builder().build()
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send `builder`, retrying transient failures.
    ///
    /// The body must be clonable (buffered) for retries to be possible.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, CadenceError> {
        let mut attempt = 1;
        loop {
            let request = rebuild(&builder)?;
            let (method, url) = (request.method().clone(), request.url().clone());
            debug!(attempt, %method, %url, "sending HTTP request");

            let retry_reason = match self.client.execute(request).await {
                Ok(response) if !response.status().is_server_error() => return Ok(response),
                Ok(response) if !self.policy.has_attempts_after(attempt) => return Ok(response),
                Ok(response) => response.status().to_string(),
                Err(err) if is_transient(&err) && self.policy.has_attempts_after(attempt) => {
                    err.to_string()
                }
                Err(err) => return Err(InfraError::from(err).into()),
            };

            attempt += 1;
            let delay = self.policy.delay_before(attempt);
            warn!(%method, %url, next_attempt = attempt, ?delay, reason = %retry_reason, "retrying HTTP request");
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

fn rebuild(builder: &RequestBuilder) -> Result<Request, CadenceError> {
    builder
        .try_clone()
        .ok_or_else(|| CadenceError::Internal("streaming request bodies cannot be retried".into()))?
        .build()
        .map_err(|err| InfraError::from(err).into())
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    policy: RetryPolicy,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            policy: RetryPolicy {
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                base_backoff: DEFAULT_BASE_BACKOFF,
            },
            user_agent: concat!("cadence/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpClientBuilder {
    /// Per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts including the first one. Clamped to at least 1.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.policy.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.policy.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn build(self) -> Result<HttpClient, CadenceError> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .no_proxy()
            .build()
            .map_err(InfraError::from)?;

        Ok(HttpClient { client, policy: self.policy })
    }
}
