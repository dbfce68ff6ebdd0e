//! Rule-based topic classification.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{instrument, trace};

use super::rules::TagRules;
use crate::publication::Publication;

/// Pattern with its lowercased form cached for case-insensitive matching.
#[derive(Debug, Clone)]
struct Pattern {
    lowered: String,
    tags: Vec<String>,
}

#[derive(Debug, Clone)]
struct AuthorContext {
    pattern: String,
    default_tags: Vec<String>,
    co_authors: Vec<(String, Vec<String>)>,
}

#[derive(Debug, Clone)]
struct Parent {
    name: String,
    children: Vec<String>,
    aliases: Vec<String>,
}

/// Applies a [`TagRules`] configuration to publications.
///
/// Classification is a pure function of the rules and the publication's
/// journal, title, authors and existing tags.
#[derive(Debug, Clone)]
pub struct TagClassifier {
    journals: Vec<Pattern>,
    keywords: Vec<Pattern>,
    authors: Vec<AuthorContext>,
    hierarchy: Vec<Parent>,
}

impl TagClassifier {
    #[must_use]
    pub fn new(rules: &TagRules) -> Self {
        let patterns = |table: &BTreeMap<String, Vec<String>>| {
            table
                .iter()
                .map(|(pattern, tags)| Pattern {
                    lowered: pattern.to_lowercase(),
                    tags: tags.clone(),
                })
                .collect::<Vec<_>>()
        };
        let lowered = |items: &[String]| -> Vec<String> {
            items.iter().map(|s| s.to_lowercase()).collect()
        };

        Self {
            journals: patterns(&rules.journal_patterns),
            keywords: patterns(&rules.title_keywords),
            authors: rules
                .author_patterns
                .iter()
                .map(|(pattern, rule)| AuthorContext {
                    pattern: pattern.clone(),
                    default_tags: rule.default_tags.clone(),
                    co_authors: rule
                        .context_rules
                        .iter()
                        .map(|(co, tags)| (co.clone(), tags.clone()))
                        .collect(),
                })
                .collect(),
            hierarchy: rules
                .tag_hierarchy
                .iter()
                .map(|(name, entry)| Parent {
                    name: name.clone(),
                    children: lowered(&entry.children),
                    aliases: lowered(&entry.aliases),
                })
                .collect(),
        }
    }

    /// Derives the final tag set, treating the publication's current tags as
    /// manual tags.
    #[must_use]
    #[instrument(skip_all, fields(title = %publication.title))]
    pub fn classify(&self, publication: &Publication) -> BTreeSet<String> {
        let mut raw: BTreeSet<String> = BTreeSet::new();
        raw.extend(self.journal_tags(&publication.journal));
        raw.extend(self.title_tags(&publication.title));
        raw.extend(self.author_tags(&publication.authors));
        raw.extend(publication.tags.iter().cloned());

        let tags = self.normalize(raw);
        trace!(count = tags.len(), "classified");
        tags
    }

    /// Tags from every journal pattern contained in `journal`.
    #[must_use]
    pub fn journal_tags(&self, journal: &str) -> BTreeSet<String> {
        substring_matches(&self.journals, journal)
    }

    /// Tags from every keyword contained in `title`.
    #[must_use]
    pub fn title_tags(&self, title: &str) -> BTreeSet<String> {
        substring_matches(&self.keywords, title)
    }

    /// Tags from author-context rules.
    ///
    /// Patterns are case-sensitive. Co-author patterns are only checked
    /// against authors that do not match the self pattern.
    #[must_use]
    pub fn author_tags(&self, authors: &[String]) -> BTreeSet<String> {
        let mut tags = BTreeSet::new();
        for context in &self.authors {
            if !authors.iter().any(|a| a.contains(&context.pattern)) {
                continue;
            }
            tags.extend(context.default_tags.iter().cloned());

            let others: Vec<&String> = authors
                .iter()
                .filter(|a| !a.contains(&context.pattern))
                .collect();
            for (co_author, co_tags) in &context.co_authors {
                if others.iter().any(|a| a.contains(co_author.as_str())) {
                    tags.extend(co_tags.iter().cloned());
                }
            }
        }
        tags
    }

    /// Applies the hierarchy: aliases are rewritten to their parent, children
    /// keep their own tag and add the parent.
    #[must_use]
    pub fn normalize(&self, raw: BTreeSet<String>) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for tag in raw {
            let lowered = tag.to_lowercase();
            let mut canonical = tag;
            for parent in &self.hierarchy {
                if parent.aliases.contains(&lowered) {
                    canonical.clone_from(&parent.name);
                    break;
                }
                if parent.children.contains(&lowered) {
                    out.insert(parent.name.clone());
                }
            }
            out.insert(canonical);
        }
        out
    }
}

fn substring_matches(patterns: &[Pattern], text: &str) -> BTreeSet<String> {
    let text = text.to_lowercase();
    patterns
        .iter()
        .filter(|pattern| text.contains(&pattern.lowered))
        .flat_map(|pattern| pattern.tags.iter().cloned())
        .collect()
}
