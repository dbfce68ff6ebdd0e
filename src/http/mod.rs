//! Outbound HTTP with bounded retries and rate-limit handling.
//!
//! Every network call made during an ingestion run goes through
//! [`RetryClient`]. Delays are routed through a [`Sleeper`] so tests can assert
//! exact retry counts and waits without real time passing.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use pubsync_core::http::{RequestSpec, RetryClient, RetryPolicy, TokioSleeper};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RetryClient::new(
//!     RetryPolicy::new(3, Duration::from_secs(1)),
//!     Arc::new(TokioSleeper),
//! )?;
//! let spec = RequestSpec::get("https://pub.orcid.org/v3.0/status", Duration::from_secs(30));
//! let response = client.send(&spec).await?;
//! println!("status {}", response.status());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod retry;
mod retry_after;
mod sleep;

pub use client::{
    DEFAULT_MAX_RATE_LIMIT_WAITS, DEFAULT_REQUEST_TIMEOUT, HttpResponse, RequestSpec, RetryClient,
};
pub use error::FetchError;
pub use retry::{
    DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy,
    classify_error,
};
pub use retry_after::{DEFAULT_RETRY_AFTER, parse_retry_after, parse_retry_after_at};
pub use sleep::{RecordingSleeper, Sleeper, TokioSleeper};
