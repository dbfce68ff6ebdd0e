//! Canonical publication record and queries over a publication list.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Venue used when neither summary nor detail names one.
pub const PREPRINT_JOURNAL: &str = "Preprint";
/// Year used when the provider has no numeric year.
pub const UNKNOWN_YEAR: &str = "N/A";

/// One publication as written to the output artifact.
///
/// Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default = "default_journal")]
    pub journal: String,
    #[serde(default = "default_year")]
    pub year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

fn default_journal() -> String {
    PREPRINT_JOURNAL.to_string()
}

fn default_year() -> String {
    UNKNOWN_YEAR.to_string()
}

impl Publication {
    /// Creates a record with only a title; every other field takes its sentinel.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            authors: Vec::new(),
            journal: default_journal(),
            year: default_year(),
            url: None,
            doi: None,
            tags: BTreeSet::new(),
        }
    }

    /// Year as a number, if it parses.
    #[must_use]
    pub fn numeric_year(&self) -> Option<u32> {
        self.year.trim().parse().ok()
    }

    /// Returns the `(title, year)` identity of this record.
    #[must_use]
    pub fn key(&self) -> (&str, &str) {
        (&self.title, &self.year)
    }
}

/// Year descending (unparsable years last), then title ascending.
#[must_use]
pub fn display_order(a: &Publication, b: &Publication) -> Ordering {
    match (a.numeric_year(), b.numeric_year()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.title.cmp(&b.title))
}

/// Drops later duplicates by `(title, year)` and sorts into display order.
#[must_use]
pub fn finalize(publications: Vec<Publication>) -> Vec<Publication> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut unique: Vec<Publication> = publications
        .into_iter()
        .filter(|p| seen.insert((p.title.clone(), p.year.clone())))
        .collect();
    unique.sort_by(display_order);
    unique
}

/// Aggregate counts over a publication list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublicationStats {
    pub publications: usize,
    pub authors: usize,
    pub tags: usize,
    pub earliest_year: Option<u32>,
    pub latest_year: Option<u32>,
}

impl fmt::Display for PublicationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} publications, {} authors, {} tags",
            self.publications, self.authors, self.tags
        )?;
        if let (Some(earliest), Some(latest)) = (self.earliest_year, self.latest_year) {
            write!(f, ", years {earliest}-{latest}")?;
        }
        Ok(())
    }
}

/// Read-only queries over a loaded artifact.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    publications: Vec<Publication>,
}

impl Catalog {
    #[must_use]
    pub fn new(publications: Vec<Publication>) -> Self {
        Self { publications }
    }

    #[must_use]
    pub fn publications(&self) -> &[Publication] {
        &self.publications
    }

    /// Records whose title or any author contains `term` (case-insensitive)
    /// and that carry every tag in `tags`. An empty term matches everything.
    #[must_use]
    pub fn search(&self, term: &str, tags: &[String]) -> Vec<&Publication> {
        let term = term.trim().to_lowercase();
        self.publications
            .iter()
            .filter(|p| {
                term.is_empty()
                    || p.title.to_lowercase().contains(&term)
                    || p.authors.iter().any(|a| a.to_lowercase().contains(&term))
            })
            .filter(|p| tags.iter().all(|tag| p.tags.contains(tag)))
            .collect()
    }

    /// Every tag in use, sorted.
    #[must_use]
    pub fn all_tags(&self) -> Vec<String> {
        self.publications
            .iter()
            .flat_map(|p| p.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    #[must_use]
    pub fn stats(&self) -> PublicationStats {
        let authors: HashSet<&str> = self
            .publications
            .iter()
            .flat_map(|p| p.authors.iter().map(String::as_str))
            .collect();
        let tags: HashSet<&str> = self
            .publications
            .iter()
            .flat_map(|p| p.tags.iter().map(String::as_str))
            .collect();
        let years = self.publications.iter().filter_map(Publication::numeric_year);

        PublicationStats {
            publications: self.publications.len(),
            authors: authors.len(),
            tags: tags.len(),
            earliest_year: years.clone().min(),
            latest_year: years.max(),
        }
    }
}
