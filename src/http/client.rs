//! Retrying HTTP client for upstream provider calls.
//!
//! [`RetryClient::send`] runs a [`RequestSpec`] through an attempt loop:
//! transient failures back off exponentially and spend the retry budget,
//! HTTP 429 waits out `Retry-After` without spending it, and everything else
//! fails immediately. All waiting goes through an injected [`Sleeper`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::retry::{FailureType, RetryDecision, RetryPolicy, classify_error};
use super::retry_after::{DEFAULT_RETRY_AFTER, parse_retry_after};
use super::{FetchError, Sleeper};
use crate::user_agent::default_user_agent;

/// Connect timeout applied to the underlying client.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default ceiling on consecutive 429 waits for a single request.
pub const DEFAULT_MAX_RATE_LIMIT_WAITS: u32 = 10;

/// A replayable request description.
///
/// The timeout is required at construction so no call can wait unbounded.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    method: Method,
    url: String,
    headers: Vec<(&'static str, String)>,
    body: Option<String>,
    timeout: Duration,
}

impl RequestSpec {
    /// Creates a GET request.
    #[must_use]
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout,
        }
    }

    /// Creates a POST request with an `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn post_form(url: impl Into<String>, fields: &[(&str, &str)], timeout: Duration) -> Self {
        let body = fields
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&");

        Self {
            method: Method::POST,
            url: url.into(),
            headers: vec![(
                "content-type",
                "application/x-www-form-urlencoded".to_string(),
            )],
            body: Some(body),
            timeout,
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Sets the `Accept` header.
    #[must_use]
    pub fn accept(self, media_type: &str) -> Self {
        self.header("accept", media_type)
    }

    /// Sets a bearer `Authorization` header.
    #[must_use]
    pub fn bearer(self, token: &str) -> Self {
        self.header("authorization", format!("Bearer {token}"))
    }

    /// Returns the request URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the encoded body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

/// A fully read, successful response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    url: String,
    status: u16,
    body: String,
}

impl HttpResponse {
    /// Returns the HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the raw response body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Decode`] when the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_str(&self.body).map_err(|e| FetchError::decode(&self.url, e.to_string()))
    }
}

/// Outcome of a single attempt.
#[derive(Debug)]
enum AttemptOutcome {
    Success(HttpResponse),
    Retryable(FetchError),
    RateLimited { wait: Duration },
    Fatal(FetchError),
}

/// HTTP client with bounded exponential backoff and 429 handling.
#[derive(Debug, Clone)]
pub struct RetryClient {
    client: Client,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    max_rate_limit_waits: u32,
}

impl RetryClient {
    /// Creates a client with the project User-Agent and gzip support.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidRequest`] if the underlying client cannot be built.
    pub fn new(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(default_user_agent())
            .gzip(true)
            .build()
            .map_err(|e| {
                FetchError::invalid_request("<client>", format!("client construction failed: {e}"))
            })?;
        Ok(Self::with_client(client, policy, sleeper))
    }

    /// Wraps an existing reqwest client.
    #[must_use]
    pub fn with_client(client: Client, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            client,
            policy,
            sleeper,
            max_rate_limit_waits: DEFAULT_MAX_RATE_LIMIT_WAITS,
        }
    }

    /// Overrides how many consecutive 429 waits a single request may take.
    #[must_use]
    pub fn with_max_rate_limit_waits(mut self, waits: u32) -> Self {
        self.max_rate_limit_waits = waits;
        self
    }

    /// Returns the retry policy in effect.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Returns the sleeper used for every delay.
    #[must_use]
    pub fn sleeper(&self) -> Arc<dyn Sleeper> {
        Arc::clone(&self.sleeper)
    }

    /// Sends a request using the client's retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Exhausted`] once the attempt budget is spent on
    /// transient failures, [`FetchError::RateLimited`] when 429 waits exceed
    /// the ceiling, or the first permanent error.
    pub async fn send(&self, spec: &RequestSpec) -> Result<HttpResponse, FetchError> {
        self.send_with_policy(spec, &self.policy).await
    }

    /// Sends a request with an explicit retry policy.
    ///
    /// # Errors
    ///
    /// See [`RetryClient::send`].
    #[instrument(skip(self, spec, policy), fields(method = %spec.method, url = %spec.url, max_attempts = policy.max_attempts()))]
    pub async fn send_with_policy(
        &self,
        spec: &RequestSpec,
        policy: &RetryPolicy,
    ) -> Result<HttpResponse, FetchError> {
        let mut attempt: u32 = 1;
        let mut rate_limit_waits: u32 = 0;

        loop {
            match self.attempt(spec).await {
                AttemptOutcome::Success(response) => {
                    debug!(attempt, status = response.status, "request succeeded");
                    return Ok(response);
                }
                AttemptOutcome::Fatal(error) => {
                    debug!(attempt, error = %error, "permanent failure");
                    return Err(error);
                }
                AttemptOutcome::RateLimited { wait } => {
                    rate_limit_waits += 1;
                    if rate_limit_waits > self.max_rate_limit_waits {
                        warn!(waits = self.max_rate_limit_waits, "rate limit wait ceiling reached");
                        return Err(FetchError::RateLimited {
                            url: spec.url.clone(),
                            waits: self.max_rate_limit_waits,
                        });
                    }
                    warn!(
                        wait_secs = wait.as_secs(),
                        rate_limit_waits, "rate limited by provider, waiting"
                    );
                    self.sleeper.sleep(wait).await;
                }
                AttemptOutcome::Retryable(error) => {
                    match policy.should_retry(FailureType::Transient, attempt) {
                        RetryDecision::Retry { delay, attempt: next } => {
                            warn!(
                                attempt,
                                delay_ms = delay.as_millis(),
                                error = %error,
                                "transient failure, retrying"
                            );
                            self.sleeper.sleep(delay).await;
                            attempt = next;
                        }
                        RetryDecision::DoNotRetry { reason } => {
                            debug!(attempt, %reason, "not retrying");
                            return Err(FetchError::Exhausted {
                                url: spec.url.clone(),
                                attempts: attempt,
                                last: Box::new(error),
                            });
                        }
                    }
                }
            }
        }
    }

    async fn attempt(&self, spec: &RequestSpec) -> AttemptOutcome {
        let mut request = self
            .client
            .request(spec.method.clone(), &spec.url)
            .timeout(spec.timeout);
        for (name, value) in &spec.headers {
            request = request.header(*name, value);
        }
        if let Some(body) = &spec.body {
            request = request.body(body.clone());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return outcome_for(map_send_error(&spec.url, e)),
        };

        let status = response.status().as_u16();
        if status == 429 {
            let wait = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(parse_retry_after)
                .unwrap_or(DEFAULT_RETRY_AFTER);
            return AttemptOutcome::RateLimited { wait };
        }
        if !response.status().is_success() {
            return outcome_for(FetchError::http_status(&spec.url, status));
        }

        match response.text().await {
            Ok(body) => AttemptOutcome::Success(HttpResponse {
                url: spec.url.clone(),
                status,
                body,
            }),
            Err(e) => outcome_for(map_send_error(&spec.url, e)),
        }
    }
}

fn map_send_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::timeout(url)
    } else {
        FetchError::network(url, error)
    }
}

fn outcome_for(error: FetchError) -> AttemptOutcome {
    match classify_error(&error) {
        FailureType::Transient => AttemptOutcome::Retryable(error),
        FailureType::Permanent | FailureType::RateLimited => AttemptOutcome::Fatal(error),
    }
}
