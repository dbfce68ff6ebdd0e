//! Topic tagging for publications.
//!
//! [`TagRules`] holds the classification policy as data (journal patterns,
//! title keywords, author context and the tag hierarchy); [`TagClassifier`]
//! applies it.

mod classifier;
mod rules;

pub use classifier::TagClassifier;
pub use rules::{AuthorRule, HierarchyEntry, RulesError, TagRules};

use std::path::Path;

use tracing::info;

/// Loads rules from `path`, or the built-in rules when no path is given.
///
/// # Errors
///
/// Returns [`RulesError`] if the file cannot be read or parsed.
pub fn load_rules(path: Option<&Path>) -> Result<TagRules, RulesError> {
    match path {
        Some(path) => {
            let rules = TagRules::from_path(path)?;
            info!(path = %path.display(), "loaded tag rules");
            Ok(rules)
        }
        None => Ok(TagRules::default()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_rules_defaults_without_path() {
        assert_eq!(load_rules(None).unwrap(), TagRules::default());
    }

    #[test]
    fn test_load_rules_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"titleKeywords": {{"cortex": ["Neuroscience"]}}}}"#).unwrap();
        let rules = load_rules(Some(file.path())).unwrap();
        assert_eq!(rules.title_keywords.len(), 1);
        assert!(rules.journal_patterns.is_empty());
    }
}
