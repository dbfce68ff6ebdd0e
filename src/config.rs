//! Run configuration, built once at startup and passed down explicitly.
//!
//! Required values come from the environment (through an injectable lookup so
//! tests never touch the real process environment); tunables have defaults
//! that the CLI may override.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::http::{DEFAULT_REQUEST_TIMEOUT, RetryPolicy};

/// Researcher identifier variable.
pub const ENV_RESEARCHER_ID: &str = "ORCID_ID";
/// OAuth client identifier variable.
pub const ENV_CLIENT_ID: &str = "ORCID_CLIENT_ID";
/// OAuth client secret variable.
pub const ENV_CLIENT_SECRET: &str = "ORCID_CLIENT_SECRET";
/// Optional API base override (used by tests and sandbox accounts).
pub const ENV_API_BASE: &str = "ORCID_API_BASE";
/// Optional token endpoint override.
pub const ENV_TOKEN_URL: &str = "ORCID_TOKEN_URL";

/// Public ORCID v3.0 API.
pub const DEFAULT_API_BASE: &str = "https://pub.orcid.org/v3.0";
/// Public ORCID token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://pub.orcid.org/oauth/token";
/// Default output artifact location, relative to the site root.
pub const DEFAULT_OUTPUT_PATH: &str = "src/data/publications.json";

/// Default pause between successive detail fetches.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(500);
/// Floor for the pause between detail fetches.
pub const MIN_REQUEST_DELAY: Duration = Duration::from_millis(300);

/// Configuration errors. Always raised before any network call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is unset or blank.
    #[error("missing required environment variable {name}")]
    MissingVar {
        /// Variable name.
        name: &'static str,
    },

    /// A configured endpoint is not an absolute http(s) URL.
    #[error("invalid URL for {field}: {value}")]
    InvalidUrl {
        /// Which setting held the value.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A tunable is out of range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Which setting held the value.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// OAuth client credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    /// Creates a credential pair.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Returns the client identifier.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Everything an ingestion run needs.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// ORCID iD of the researcher whose works are fetched.
    pub researcher_id: String,
    /// OAuth client credentials.
    pub credentials: Credentials,
    /// API base, without trailing slash.
    pub api_base: String,
    /// OAuth token endpoint.
    pub token_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Retry budget and initial backoff.
    pub retry: RetryPolicy,
    /// Pause between successive detail fetches.
    pub request_delay: Duration,
    /// Output artifact path.
    pub output_path: PathBuf,
}

impl IngestConfig {
    /// Builds a configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] for the first missing required
    /// variable, or [`ConfigError::InvalidUrl`] for a malformed endpoint override.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`IngestConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::MissingVar { name })
        };

        let researcher_id = required(ENV_RESEARCHER_ID)?;
        let client_id = required(ENV_CLIENT_ID)?;
        let client_secret = required(ENV_CLIENT_SECRET)?;

        let optional = |name: &str, default: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let api_base = validate_url("api_base", &optional(ENV_API_BASE, DEFAULT_API_BASE))?;
        let token_url = validate_url("token_url", &optional(ENV_TOKEN_URL, DEFAULT_TOKEN_URL))?;

        Ok(Self {
            researcher_id,
            credentials: Credentials::new(client_id, client_secret),
            api_base: api_base.trim_end_matches('/').to_string(),
            token_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
            request_delay: DEFAULT_REQUEST_DELAY,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        })
    }

    /// Sets the pause between detail fetches.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] below [`MIN_REQUEST_DELAY`].
    pub fn with_request_delay(mut self, delay: Duration) -> Result<Self, ConfigError> {
        if delay < MIN_REQUEST_DELAY {
            return Err(ConfigError::InvalidValue {
                field: "request_delay",
                reason: format!(
                    "{}ms is below the {}ms minimum",
                    delay.as_millis(),
                    MIN_REQUEST_DELAY.as_millis()
                ),
            });
        }
        self.request_delay = delay;
        Ok(self)
    }

    /// Sets the per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout",
                reason: "timeout must be greater than zero".to_string(),
            });
        }
        self.request_timeout = timeout;
        Ok(self)
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the output artifact path.
    #[must_use]
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }
}

fn validate_url(field: &'static str, value: &str) -> Result<String, ConfigError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(value.to_string()),
        _ => Err(ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
        }),
    }
}
