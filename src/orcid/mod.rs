//! ORCID v3.0 public API adapter.
//!
//! [`OrcidClient`] performs the three upstream calls of an ingestion run
//! (token exchange, works listing, work detail) on top of the shared
//! [`RetryClient`]. The pipeline depends on the [`WorkSource`] trait rather
//! than the concrete client so it can be driven by an in-memory source in
//! tests.

mod auth;
mod model;
mod works;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::IngestConfig;
use crate::error::{IngestError, RecordError};
use crate::http::{FetchError, RetryClient, Sleeper};

pub use auth::{AccessToken, READ_PUBLIC_SCOPE};
pub use model::{
    Contributors, ExternalId, ExternalIds, PublicationDate, RawContributor, RawWorkDetail,
    RawWorkSummary, StringValue, TitleBlock, WorkGroup, YearValue,
};
pub use works::{ORCID_JSON, parse_work_groups};

/// Upstream source of works for one researcher.
#[async_trait]
pub trait WorkSource: Send + Sync {
    /// Obtains a bearer token, or `None` when authentication failed.
    async fn acquire_token(&self) -> Option<AccessToken>;

    /// Lists work summaries.
    ///
    /// # Errors
    ///
    /// Any error here is fatal for the run.
    async fn list_works(&self, token: &AccessToken) -> Result<Vec<RawWorkSummary>, IngestError>;

    /// Fetches the detail record for one summary.
    ///
    /// # Errors
    ///
    /// Errors are scoped to the work; the caller skips it.
    async fn fetch_detail(
        &self,
        summary: &RawWorkSummary,
        token: &AccessToken,
    ) -> Result<RawWorkDetail, RecordError>;
}

/// HTTP client for the ORCID public API.
#[derive(Debug, Clone)]
pub struct OrcidClient {
    http: RetryClient,
    config: IngestConfig,
}

impl OrcidClient {
    /// Creates a client using the configured retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidRequest`] if the HTTP client cannot be built.
    pub fn new(config: IngestConfig, sleeper: Arc<dyn Sleeper>) -> Result<Self, FetchError> {
        let http = RetryClient::new(config.retry.clone(), sleeper)?;
        Ok(Self::with_http(config, http))
    }

    /// Creates a client over an existing [`RetryClient`].
    #[must_use]
    pub fn with_http(config: IngestConfig, http: RetryClient) -> Self {
        Self { http, config }
    }

    /// Returns the run configuration.
    #[must_use]
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }
}

#[async_trait]
impl WorkSource for OrcidClient {
    async fn acquire_token(&self) -> Option<AccessToken> {
        OrcidClient::acquire_token(self).await
    }

    async fn list_works(&self, token: &AccessToken) -> Result<Vec<RawWorkSummary>, IngestError> {
        OrcidClient::list_works(self, token).await
    }

    async fn fetch_detail(
        &self,
        summary: &RawWorkSummary,
        token: &AccessToken,
    ) -> Result<RawWorkDetail, RecordError> {
        OrcidClient::fetch_detail(self, summary, token).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::http::RecordingSleeper;

    fn client(api_base: &str) -> OrcidClient {
        let config = IngestConfig::from_lookup(|name| match name {
            "ORCID_ID" => Some("0000-0003-2882-0900".to_string()),
            "ORCID_CLIENT_ID" => Some("APP-TEST".to_string()),
            "ORCID_CLIENT_SECRET" => Some("s3cret".to_string()),
            "ORCID_API_BASE" => Some(api_base.to_string()),
            _ => None,
        })
        .unwrap();
        OrcidClient::new(config, Arc::new(RecordingSleeper::new())).unwrap()
    }

    #[test]
    fn test_works_url() {
        let client = client("https://pub.orcid.org/v3.0/");
        assert_eq!(
            client.works_url(),
            "https://pub.orcid.org/v3.0/0000-0003-2882-0900/works"
        );
    }

    #[test]
    fn test_detail_url_prefers_relative_path() {
        let client = client("https://pub.orcid.org/v3.0");
        let summary = RawWorkSummary {
            put_code: Some(7),
            path: Some("/0000-0003-2882-0900/work/12345".to_string()),
            ..RawWorkSummary::default()
        };
        assert_eq!(
            client.detail_url(&summary).unwrap(),
            "https://pub.orcid.org/v3.0/0000-0003-2882-0900/work/12345"
        );
    }

    #[test]
    fn test_detail_url_falls_back_to_put_code() {
        let client = client("https://pub.orcid.org/v3.0");
        let summary = RawWorkSummary {
            put_code: Some(99),
            ..RawWorkSummary::default()
        };
        assert_eq!(
            client.detail_url(&summary).unwrap(),
            "https://pub.orcid.org/v3.0/0000-0003-2882-0900/work/99"
        );
    }

    #[test]
    fn test_detail_url_keeps_absolute_path() {
        let client = client("https://pub.orcid.org/v3.0");
        let summary = RawWorkSummary {
            path: Some("https://api.example.org/work/1".to_string()),
            ..RawWorkSummary::default()
        };
        assert_eq!(
            client.detail_url(&summary).unwrap(),
            "https://api.example.org/work/1"
        );
    }

    #[test]
    fn test_detail_url_without_identifier_is_record_error() {
        let client = client("https://pub.orcid.org/v3.0");
        let err = client.detail_url(&RawWorkSummary::default()).unwrap_err();
        assert!(matches!(err, RecordError::MissingIdentifier { .. }));
    }
}
