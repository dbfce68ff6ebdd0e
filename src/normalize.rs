//! Mapping of ORCID summary/detail pairs onto [`Publication`].
//!
//! Every optional field degrades to a sentinel or an omission. Only a missing
//! title rejects the record.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::error::RecordError;
use crate::orcid::{
    ExternalIds, PublicationDate, RawContributor, RawWorkDetail, RawWorkSummary, TitleBlock,
};
use crate::publication::{PREPRINT_JOURNAL, Publication, UNKNOWN_YEAR};

/// Resolver prefixes some records carry in front of the bare DOI.
#[allow(clippy::expect_used)]
static DOI_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    // Static pattern, safe to panic
    Regex::new(r"(?i)^(?:https?://(?:dx\.)?doi\.org/|doi:\s*)").expect("DOI prefix regex is valid")
});

/// External identifier type carrying a DOI.
const DOI_ID_TYPE: &str = "doi";

/// Builds a publication from a work summary and its detail record.
///
/// # Errors
///
/// Returns [`RecordError::MissingTitle`] when neither record has a title.
pub fn normalize(
    summary: &RawWorkSummary,
    detail: &RawWorkDetail,
) -> Result<Publication, RecordError> {
    let title = title_text(summary.title.as_ref())
        .or_else(|| title_text(detail.title.as_ref()))
        .ok_or_else(|| RecordError::MissingTitle {
            work_id: summary.work_id(),
        })?
        .to_string();

    let journal = summary
        .journal_title
        .as_ref()
        .and_then(|value| value.text())
        .or_else(|| detail.journal_title.as_ref().and_then(|value| value.text()))
        .unwrap_or(PREPRINT_JOURNAL)
        .to_string();

    let doi = extract_doi(summary.external_ids.as_ref())
        .or_else(|| extract_doi(detail.external_ids.as_ref()));

    let url = summary
        .url
        .as_ref()
        .and_then(|value| value.text())
        .or_else(|| detail.url.as_ref().and_then(|value| value.text()))
        .map(ToString::to_string)
        .or_else(|| doi.as_ref().map(|doi| format!("https://doi.org/{doi}")));

    let year = extract_year(summary.publication_date.as_ref())
        .or_else(|| extract_year(detail.publication_date.as_ref()))
        .unwrap_or_else(|| UNKNOWN_YEAR.to_string());

    let authors: Vec<String> = detail
        .contributors
        .iter()
        .flat_map(|contributors| contributors.contributor.iter())
        .filter_map(author_name)
        .collect();

    trace!(title = %title, authors = authors.len(), "normalized work");

    Ok(Publication {
        title,
        authors,
        journal,
        year,
        url,
        doi,
        tags: BTreeSet::new(),
    })
}

/// Display name for a contributor, or `None` if nothing usable is present.
///
/// Precedence: credit name verbatim, then "Given Family" whenever both parts
/// exist, then the family name alone. A given name without a family name is
/// not enough to identify the author.
#[must_use]
pub fn author_name(contributor: &RawContributor) -> Option<String> {
    if let Some(credit) = contributor.credit_name.as_ref().and_then(|v| v.text()) {
        return Some(credit.to_string());
    }

    let given = contributor.given_names.as_ref().and_then(|v| v.text());
    let family = contributor.family_name.as_ref().and_then(|v| v.text())?;

    Some(match given {
        Some(given) => format!("{given} {family}"),
        None => family.to_string(),
    })
}

/// First DOI among the external identifiers, stripped of resolver prefixes.
#[must_use]
pub fn extract_doi(ids: Option<&ExternalIds>) -> Option<String> {
    ids?
        .external_id
        .iter()
        .find(|id| id.external_id_type.as_deref() == Some(DOI_ID_TYPE))
        .and_then(|id| id.external_id_value.as_deref())
        .map(normalize_doi)
        .filter(|doi| !doi.is_empty())
}

/// Strips `https://doi.org/`, `https://dx.doi.org/` and `doi:` prefixes.
#[must_use]
pub fn normalize_doi(raw: &str) -> String {
    DOI_PREFIX.replace(raw.trim(), "").trim().to_string()
}

fn title_text(block: Option<&TitleBlock>) -> Option<&str> {
    block?.title.as_ref()?.text()
}

fn extract_year(date: Option<&PublicationDate>) -> Option<String> {
    let year = match date?.year.as_ref()?.value.as_ref()? {
        serde_json::Value::String(text) => text.trim().to_string(),
        serde_json::Value::Number(number) => number.to_string(),
        _ => return None,
    };
    (!year.is_empty() && year.chars().all(|c| c.is_ascii_digit())).then_some(year)
}
