//! Persistence of the publication list.
//!
//! The JSON artifact is the primary output and the source of truth between
//! runs. Writes always back up the previous version first.

mod json;

pub use json::{JsonStore, PersistOutcome};

use std::path::PathBuf;

use thiserror::Error;

/// Errors reading or writing the artifact.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure at `path`.
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact exists but is not a publication list.
    #[error("cannot parse '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The publication list could not be serialized.
    #[error("JSON serialization error: {0}")]
    Serialize(#[source] serde_json::Error),
}
