//! Works listing and per-work detail retrieval.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::model::{RawWorkDetail, RawWorkSummary, WorkGroup};
use super::{AccessToken, OrcidClient};
use crate::error::{IngestError, RecordError};
use crate::http::{FetchError, RequestSpec};

/// Media type of ORCID JSON responses.
pub const ORCID_JSON: &str = "application/vnd.orcid+json";

impl OrcidClient {
    /// URL of the works listing for the configured researcher.
    #[must_use]
    pub fn works_url(&self) -> String {
        format!("{}/{}/works", self.config.api_base, self.config.researcher_id)
    }

    /// Resolves the detail URL for a summary.
    ///
    /// Prefers the provider-supplied `path` (relative to the API base, or
    /// absolute); falls back to the put-code.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::MissingIdentifier`] when neither is present.
    pub fn detail_url(&self, summary: &RawWorkSummary) -> Result<String, RecordError> {
        match (&summary.path, summary.put_code) {
            (Some(path), _) if path.starts_with("http://") || path.starts_with("https://") => {
                Ok(path.clone())
            }
            (Some(path), _) if !path.trim().is_empty() => {
                let path = path.trim();
                if path.starts_with('/') {
                    Ok(format!("{}{path}", self.config.api_base))
                } else {
                    Ok(format!("{}/{path}", self.config.api_base))
                }
            }
            (_, Some(put_code)) => Ok(format!(
                "{}/{}/work/{put_code}",
                self.config.api_base, self.config.researcher_id
            )),
            _ => Err(RecordError::MissingIdentifier {
                work_id: summary.work_id(),
            }),
        }
    }

    /// Lists the researcher's works, one summary per group.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Upstream`] if the request fails after retries and
    /// [`IngestError::UnexpectedFormat`] if the body has no `group` list.
    #[instrument(skip(self, token), fields(researcher = %self.config.researcher_id))]
    pub async fn list_works(
        &self,
        token: &AccessToken,
    ) -> Result<Vec<RawWorkSummary>, IngestError> {
        let url = self.works_url();
        let spec = RequestSpec::get(&url, self.config.request_timeout)
            .accept(ORCID_JSON)
            .bearer(token.secret());

        let response = self.http.send(&spec).await?;
        let body: Value = response
            .json()
            .map_err(|e| IngestError::unexpected_format(&url, e.to_string()))?;
        parse_work_groups(&url, body)
    }

    /// Fetches the full record for one work.
    ///
    /// # Errors
    ///
    /// Returns a [`RecordError`]; the caller skips the work.
    #[instrument(skip(self, summary, token), fields(work = %summary.work_id()))]
    pub async fn fetch_detail(
        &self,
        summary: &RawWorkSummary,
        token: &AccessToken,
    ) -> Result<RawWorkDetail, RecordError> {
        let url = self.detail_url(summary)?;
        debug!(url = %url, "fetching work detail");

        let spec = RequestSpec::get(&url, self.config.request_timeout)
            .accept(ORCID_JSON)
            .bearer(token.secret());

        let fetch = |source: FetchError| RecordError::Fetch {
            work_id: summary.work_id(),
            source,
        };
        let response = self.http.send(&spec).await.map_err(fetch)?;
        response.json::<RawWorkDetail>().map_err(fetch)
    }
}

/// Validates the listing body and takes the first summary of every group.
///
/// A group that fails to decode is logged and skipped.
///
/// # Errors
///
/// Returns [`IngestError::UnexpectedFormat`] if `group` is absent or not a list.
pub fn parse_work_groups(url: &str, body: Value) -> Result<Vec<RawWorkSummary>, IngestError> {
    let Some(Value::Array(groups)) = body.get("group") else {
        return Err(IngestError::unexpected_format(
            url,
            "response has no `group` list",
        ));
    };

    let total = groups.len();
    let summaries: Vec<RawWorkSummary> = groups
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let group = match WorkGroup::deserialize(raw) {
                Ok(group) => group,
                Err(e) => {
                    warn!(group = index, error = %e, "malformed work group, skipping");
                    return None;
                }
            };
            let first = group.work_summary.into_iter().next();
            if first.is_none() {
                warn!(group = index, "work group without summaries, ignoring");
            }
            first
        })
        .collect();

    debug!(groups = total, works = summaries.len(), "parsed works listing");
    Ok(summaries)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_work_groups_takes_first_summary_per_group() {
        let body = serde_json::json!({
            "last-modified-date": null,
            "group": [
                {"work-summary": [
                    {"put-code": 1, "title": {"title": {"value": "Preferred"}}},
                    {"put-code": 2, "title": {"title": {"value": "Duplicate source"}}}
                ]},
                {"work-summary": [{"put-code": 3}]}
            ]
        });

        let summaries = parse_work_groups("https://x/works", body).unwrap();
        let codes: Vec<_> = summaries.iter().map(|s| s.put_code).collect();
        assert_eq!(codes, vec![Some(1), Some(3)]);
    }

    #[test]
    fn test_parse_work_groups_skips_empty_group() {
        let body = serde_json::json!({"group": [{"work-summary": []}, {"work-summary": [{"put-code": 9}]}]});
        let summaries = parse_work_groups("https://x/works", body).unwrap();
        assert_eq!(summaries.len(), 1);
    }

    #[test]
    fn test_parse_work_groups_malformed_group_is_skipped() {
        let body = serde_json::json!({"group": [
            {"work-summary": [{"put-code": 1}]},
            {"work-summary": [{"put-code": "not-a-number"}]},
            {"work-summary": [{"put-code": 3, "external-ids": {"external-id": null}}]}
        ]});

        let summaries = parse_work_groups("https://x/works", body).unwrap();
        let codes: Vec<_> = summaries.iter().map(|s| s.put_code).collect();
        assert_eq!(codes, vec![Some(1), Some(3)]);
    }

    #[test]
    fn test_parse_work_groups_empty_list_is_valid() {
        let summaries = parse_work_groups("https://x/works", serde_json::json!({"group": []})).unwrap();
        assert!(summaries.is_empty());
    }

    #[test]
    fn test_parse_work_groups_missing_group_is_unexpected_format() {
        let err = parse_work_groups("https://x/works", serde_json::json!({"error": "nope"}))
            .unwrap_err();
        assert!(matches!(err, IngestError::UnexpectedFormat { .. }));
    }

    #[test]
    fn test_parse_work_groups_non_list_group_is_unexpected_format() {
        let err = parse_work_groups("https://x/works", serde_json::json!({"group": {"a": 1}}))
            .unwrap_err();
        assert!(matches!(err, IngestError::UnexpectedFormat { .. }));
    }
}
