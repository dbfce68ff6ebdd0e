//! Wire types for the ORCID v3.0 public API.
//!
//! Field names are the provider's kebab-case vocabulary and must match
//! verbatim. Everything is optional: ORCID omits or nulls fields freely and
//! the normalizer decides what is required.

use serde::{Deserialize, Deserializer};

/// Reads an explicit `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `{"value": "..."}` wrapper used by most ORCID scalar fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StringValue {
    #[serde(default)]
    pub value: Option<String>,
}

impl StringValue {
    /// Returns the trimmed value, or `None` when absent or blank.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.value
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Year wrapper. ORCID sends a string, but older records carry a bare number.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct YearValue {
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PublicationDate {
    #[serde(default)]
    pub year: Option<YearValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TitleBlock {
    #[serde(default)]
    pub title: Option<StringValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExternalId {
    #[serde(default)]
    pub external_id_type: Option<String>,
    #[serde(default)]
    pub external_id_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExternalIds {
    #[serde(default, deserialize_with = "null_as_default")]
    pub external_id: Vec<ExternalId>,
}

/// One entry of the `works` listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawWorkSummary {
    #[serde(default)]
    pub put_code: Option<u64>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub title: Option<TitleBlock>,
    #[serde(default)]
    pub journal_title: Option<StringValue>,
    #[serde(default)]
    pub external_ids: Option<ExternalIds>,
    #[serde(default)]
    pub url: Option<StringValue>,
    #[serde(default)]
    pub publication_date: Option<PublicationDate>,
}

impl RawWorkSummary {
    /// Identifier used in log lines: the put-code when known, else the path.
    #[must_use]
    pub fn work_id(&self) -> String {
        match (&self.put_code, &self.path) {
            (Some(code), _) => code.to_string(),
            (None, Some(path)) => path.clone(),
            (None, None) => "<unidentified>".to_string(),
        }
    }
}

/// A group of summaries that the provider considers the same logical work.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WorkGroup {
    #[serde(
        default,
        rename = "work-summary",
        deserialize_with = "null_as_default"
    )]
    pub work_summary: Vec<RawWorkSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawContributor {
    #[serde(default)]
    pub credit_name: Option<StringValue>,
    #[serde(default)]
    pub given_names: Option<StringValue>,
    #[serde(default)]
    pub family_name: Option<StringValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Contributors {
    #[serde(default, deserialize_with = "null_as_default")]
    pub contributor: Vec<RawContributor>,
}

/// Full record returned by the work-detail endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawWorkDetail {
    #[serde(default)]
    pub title: Option<TitleBlock>,
    #[serde(default)]
    pub journal_title: Option<StringValue>,
    #[serde(default)]
    pub contributors: Option<Contributors>,
    #[serde(default)]
    pub external_ids: Option<ExternalIds>,
    #[serde(default)]
    pub url: Option<StringValue>,
    #[serde(default)]
    pub publication_date: Option<PublicationDate>,
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_work_summary_deserialize_full() {
        let json = serde_json::json!({
            "put-code": 12345,
            "path": "/0000-0003-2882-0900/work/12345",
            "title": {"title": {"value": "Reproducible neuroimaging"}},
            "journal-title": {"value": "Imaging Neuroscience"},
            "external-ids": {"external-id": [
                {"external-id-type": "doi", "external-id-value": "10.1162/imag_a_00001"}
            ]},
            "url": null,
            "publication-date": {"year": {"value": "2024"}, "month": {"value": "03"}}
        });

        let summary: RawWorkSummary = serde_json::from_value(json).unwrap();
        assert_eq!(summary.put_code, Some(12345));
        assert_eq!(summary.work_id(), "12345");
        assert_eq!(
            summary.journal_title.unwrap().text(),
            Some("Imaging Neuroscience")
        );
        assert!(summary.url.is_none());
        assert_eq!(summary.external_ids.unwrap().external_id.len(), 1);
    }

    #[test]
    fn test_work_summary_deserialize_empty_object() {
        let summary: RawWorkSummary = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(summary, RawWorkSummary::default());
        assert_eq!(summary.work_id(), "<unidentified>");
    }

    #[test]
    fn test_detail_contributors_deserialize() {
        let json = serde_json::json!({
            "contributors": {"contributor": [
                {"credit-name": {"value": "Yibei Chen"}, "contributor-orcid": null},
                {"credit-name": null}
            ]}
        });

        let detail: RawWorkDetail = serde_json::from_value(json).unwrap();
        let contributors = detail.contributors.unwrap().contributor;
        assert_eq!(contributors.len(), 2);
        assert_eq!(
            contributors[0].credit_name.as_ref().unwrap().text(),
            Some("Yibei Chen")
        );
        assert!(contributors[1].credit_name.is_none());
    }

    #[test]
    fn test_null_lists_read_as_empty() {
        let json = serde_json::json!({
            "title": {"title": {"value": "Gaze in social media"}},
            "contributors": {"contributor": null},
            "external-ids": {"external-id": null}
        });

        let detail: RawWorkDetail = serde_json::from_value(json).unwrap();
        assert!(detail.contributors.unwrap().contributor.is_empty());
        assert!(detail.external_ids.unwrap().external_id.is_empty());

        let group: WorkGroup =
            serde_json::from_value(serde_json::json!({"work-summary": null})).unwrap();
        assert!(group.work_summary.is_empty());
    }

    #[test]
    fn test_string_value_blank_is_absent() {
        let value = StringValue {
            value: Some("   ".to_string()),
        };
        assert_eq!(value.text(), None);
    }

    #[test]
    fn test_year_value_accepts_number() {
        let date: PublicationDate =
            serde_json::from_value(serde_json::json!({"year": {"value": 2021}})).unwrap();
        assert_eq!(
            date.year.unwrap().value,
            Some(serde_json::Value::from(2021))
        );
    }
}
