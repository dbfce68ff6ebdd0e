//! Tag rule configuration.
//!
//! Rules are plain data. The JSON layout uses camelCase keys
//! (`journalPatterns`, `titleKeywords`, `authorPatterns`, `tagHierarchy`) so
//! existing rule files load unchanged.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

/// Errors loading a rules file.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("cannot read rules file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rules file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Tags applied when a "self" author pattern matches, plus tags that depend on
/// which co-authors appear alongside.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthorRule {
    pub default_tags: Vec<String>,
    pub context_rules: BTreeMap<String, Vec<String>>,
}

/// Children and aliases of one canonical parent tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyEntry {
    pub children: Vec<String>,
    pub aliases: Vec<String>,
}

/// Complete classification policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRules {
    /// Journal substring to tags.
    #[serde(default)]
    pub journal_patterns: BTreeMap<String, Vec<String>>,
    /// Title keyword to tags.
    #[serde(default)]
    pub title_keywords: BTreeMap<String, Vec<String>>,
    /// Author substring to its rule.
    #[serde(default)]
    pub author_patterns: BTreeMap<String, AuthorRule>,
    /// Parent tag to its children and aliases.
    ///
    /// Parents are checked in sorted name order, not file order. The first
    /// parent listing a tag as an alias rewrites it and ends the scan, so a
    /// parent listing it as a child is only added when it sorts earlier.
    #[serde(default)]
    pub tag_hierarchy: BTreeMap<String, HierarchyEntry>,
}

impl TagRules {
    /// An empty rule set: classification only applies the (empty) hierarchy.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            journal_patterns: BTreeMap::new(),
            title_keywords: BTreeMap::new(),
            author_patterns: BTreeMap::new(),
            tag_hierarchy: BTreeMap::new(),
        }
    }

    /// Parses rules from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed input.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Loads rules from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError`] if the file cannot be read or parsed.
    #[instrument]
    pub fn from_path(path: &Path) -> Result<Self, RulesError> {
        let content = std::fs::read_to_string(path).map_err(|source| RulesError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| RulesError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn table(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(key, tags)| {
            (
                (*key).to_string(),
                tags.iter().map(ToString::to_string).collect(),
            )
        })
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

impl Default for TagRules {
    /// The site's built-in rule set.
    fn default() -> Self {
        let journal_patterns = table(&[
            ("Neuropsychologia", &["Neuroscience", "Cognitive Science"]),
            ("Frontiers in Neuroimaging", &["Neuroimaging", "Neuroscience"]),
            ("Imaging Neuroscience", &["Neuroimaging", "Neuroscience"]),
            ("Biological Psychiatry", &["Neuroscience", "Brain Imaging"]),
            (
                "Journal of Computer-Mediated Communication",
                &["Media Studies", "Digital Communication"],
            ),
            (
                "Communication Methods and Measures",
                &["Communication", "Research Methods"],
            ),
            ("Computers in Human Behavior", &["Human Behavior", "Digital Media"]),
            (
                "Information, Communication & Society",
                &["Media Studies", "Social Science"],
            ),
            (
                "International Journal of Environmental Research and Public Health",
                &["Public Health"],
            ),
            (
                "Journal of Medical Internet Research",
                &["Research Methods", "Digital Health"],
            ),
            ("Telematics and Informatics", &["Technology", "Digital Media"]),
            ("bioRxiv", &["Preprint"]),
            ("Preprint", &["Preprint"]),
        ]);

        let title_keywords = table(&[
            ("fMRI", &["fMRI", "Neuroimaging"]),
            ("neuroimaging", &["Neuroimaging", "Neuroscience"]),
            ("brain", &["Neuroscience", "Brain Science"]),
            ("neural", &["Neuroscience"]),
            ("cognitive", &["Cognitive Science"]),
            ("social", &["Social Science"]),
            ("media", &["Media Studies"]),
            ("AI", &["Artificial Intelligence"]),
            ("artificial intelligence", &["Artificial Intelligence"]),
            ("reproducib", &["Reproducibility", "Open Science"]),
            ("BIDS", &["BIDS", "Neuroimaging", "Data Standards"]),
            ("survey", &["Survey Design", "Research Methods"]),
            ("schema", &["Data Standards", "Research Methods"]),
            ("decision", &["Decision Making"]),
            ("game", &["Game Theory", "Behavioral Science"]),
            ("narrative", &["Narrative Processing", "Language"]),
            ("discourse", &["Discourse Analysis", "Language"]),
            ("COVID", &["COVID-19", "Public Health"]),
            ("obesity", &["Public Health", "Health Communication"]),
            ("eating disorder", &["Mental Health", "Health Communication"]),
            ("gender", &["Gender Studies"]),
            ("moral", &["Moral Psychology", "Social Psychology"]),
            ("emotion", &["Emotion", "Psychology"]),
            ("network", &["Network Analysis", "Computational Methods"]),
            ("computational", &["Computational Methods"]),
            ("machine learning", &["Machine Learning", "Computational Methods"]),
            (
                "natural language",
                &["Natural Language Processing", "Computational Methods"],
            ),
        ]);

        let mut author_patterns = BTreeMap::new();
        author_patterns.insert(
            "Yibei Chen".to_string(),
            AuthorRule {
                default_tags: Vec::new(),
                context_rules: table(&[
                    ("Weber", &["Media Neuroscience", "Communication"]),
                    ("Ghosh", &["Reproducibility", "Open Science"]),
                    ("Sun", &["Health Communication", "Chinese Media"]),
                ]),
            },
        );

        let hierarchy: [(&str, &[&str], &[&str]); 5] = [
            (
                "Neuroscience",
                &["Cognitive Science", "Social Neuroscience", "Brain Science"],
                &["Neural", "Brain Research"],
            ),
            (
                "Neuroimaging",
                &["fMRI", "Brain Imaging"],
                &["Brain Imaging", "Neural Imaging"],
            ),
            (
                "Research Methods",
                &["Reproducibility", "Data Standards", "Survey Design", "Open Science"],
                &["Methodology", "Methods"],
            ),
            (
                "Media Studies",
                &["Digital Media", "Health Communication", "Chinese Media"],
                &["Communication", "Media Research"],
            ),
            (
                "Computational Methods",
                &["Machine Learning", "Natural Language Processing", "Network Analysis"],
                &["Data Science", "Computational Analysis"],
            ),
        ];
        let tag_hierarchy = hierarchy
            .iter()
            .map(|(parent, children, aliases)| {
                (
                    (*parent).to_string(),
                    HierarchyEntry {
                        children: strings(children),
                        aliases: strings(aliases),
                    },
                )
            })
            .collect();

        Self {
            journal_patterns,
            title_keywords,
            author_patterns,
            tag_hierarchy,
        }
    }
}
