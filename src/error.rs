//! Error taxonomy for an ingestion run.
//!
//! [`IngestError`] is fatal: the run stops and the persisted artifact is left
//! as it was. [`RecordError`] is scoped to one work and is absorbed by the
//! pipeline, which skips the work and keeps going.

use thiserror::Error;

use crate::config::ConfigError;
use crate::db::DbError;
use crate::http::FetchError;
use crate::store::StoreError;

/// Fatal failures of an ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Required identifiers or credentials are missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// No access token could be obtained.
    #[error("authentication failed: {reason}")]
    Auth {
        /// Why the token could not be acquired.
        reason: String,
    },

    /// The provider answered with a body missing its expected top-level shape.
    #[error("unexpected response format from {url}: {reason}")]
    UnexpectedFormat {
        /// The endpoint that returned the body.
        url: String,
        /// What was missing.
        reason: String,
    },

    /// A required upstream call failed, including after exhausting retries.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] FetchError),

    /// The output artifact could not be written.
    #[error("write failed: {0}")]
    Write(#[from] StoreError),

    /// The optional relational backend rejected the run's output.
    #[error("database error: {0}")]
    Database(#[from] DbError),
}

impl IngestError {
    /// Creates an authentication error.
    pub fn auth(reason: impl Into<String>) -> Self {
        Self::Auth {
            reason: reason.into(),
        }
    }

    /// Creates an unexpected-format error.
    pub fn unexpected_format(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnexpectedFormat {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` when the failure came from a transient condition that
    /// outlasted the retry budget.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Upstream(error) if error.is_exhausted())
    }
}

/// Failure scoped to a single work.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The detail request failed.
    #[error("work {work_id}: detail fetch failed: {source}")]
    Fetch {
        /// Provider identifier of the work.
        work_id: String,
        /// The underlying fetch error.
        #[source]
        source: FetchError,
    },

    /// The summary carries neither a path nor a put-code to fetch detail with.
    #[error("work {work_id}: no detail path or put-code")]
    MissingIdentifier {
        /// Provider identifier of the work (best effort).
        work_id: String,
    },

    /// Neither summary nor detail carries a non-empty title.
    #[error("work {work_id}: missing title")]
    MissingTitle {
        /// Provider identifier of the work.
        work_id: String,
    },
}

impl RecordError {
    /// Returns the provider identifier of the failed work.
    #[must_use]
    pub fn work_id(&self) -> &str {
        match self {
            Self::Fetch { work_id, .. }
            | Self::MissingIdentifier { work_id }
            | Self::MissingTitle { work_id } => work_id,
        }
    }
}
