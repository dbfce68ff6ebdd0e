//! Error types for outbound HTTP calls.
//!
//! Every variant carries the URL that failed so log lines and the final run
//! summary point at the offending endpoint.

use thiserror::Error;

/// Errors that can occur while talking to the upstream provider.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused/reset, TLS errors, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The provider kept answering 429 past the configured wait ceiling.
    #[error("rate limited requesting {url} after {waits} waits")]
    RateLimited {
        /// The URL that was rate limited.
        url: String,
        /// How many Retry-After waits were honored before giving up.
        waits: u32,
    },

    /// All attempts failed with retryable errors.
    #[error("giving up on {url} after {attempts} attempts: {last}")]
    Exhausted {
        /// The URL that kept failing.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        last: Box<FetchError>,
    },

    /// The request could not be built (bad URL, bad header value).
    #[error("invalid request to {url}: {reason}")]
    InvalidRequest {
        /// The URL of the rejected request.
        url: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The response body could not be decoded as the expected JSON.
    #[error("invalid response body from {url}: {reason}")]
    Decode {
        /// The URL whose body failed to decode.
        url: String,
        /// Decoder message.
        reason: String,
    },
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an invalid-request error.
    pub fn invalid_request(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a body decode error.
    pub fn decode(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Returns the HTTP status carried by this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Exhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    /// Returns `true` when the retry budget was spent on transient failures.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. } | Self::RateLimited { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_timeout_display() {
        let error = FetchError::timeout("https://pub.orcid.org/v3.0/x/works");
        let msg = error.to_string();
        assert!(msg.contains("timeout"));
        assert!(msg.contains("https://pub.orcid.org/v3.0/x/works"));
    }

    #[test]
    fn test_fetch_error_http_status_display() {
        let error = FetchError::http_status("https://pub.orcid.org/oauth/token", 401);
        let msg = error.to_string();
        assert!(msg.contains("401"), "Expected '401' in: {msg}");
        assert_eq!(error.status(), Some(401));
    }

    #[test]
    fn test_fetch_error_exhausted_reports_last_status() {
        let error = FetchError::Exhausted {
            url: "https://example.com".to_string(),
            attempts: 3,
            last: Box::new(FetchError::http_status("https://example.com", 503)),
        };
        assert!(error.is_exhausted());
        assert_eq!(error.status(), Some(503));
        assert!(error.to_string().contains("3 attempts"));
    }

    #[test]
    fn test_fetch_error_rate_limited_counts_as_exhausted() {
        let error = FetchError::RateLimited {
            url: "https://example.com".to_string(),
            waits: 10,
        };
        assert!(error.is_exhausted());
        assert_eq!(error.status(), None);
    }
}
