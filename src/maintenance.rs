//! Operations over an existing artifact: re-tagging and database migration.

use std::path::PathBuf;

use tracing::{info, instrument};

use crate::error::IngestError;
use crate::publication::{Catalog, PublicationStats};
use crate::repository::{PublicationRepository, UpsertSummary};
use crate::store::{JsonStore, StoreError};
use crate::tags::TagClassifier;

/// Result of [`retag`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetagReport {
    pub updated: usize,
    pub distinct_tags: Vec<String>,
    pub backup: Option<PathBuf>,
}

/// Recomputes tags for every record of the artifact, keeping current tags as
/// manual tags, and rewrites it.
///
/// # Errors
///
/// Returns [`StoreError`] if the artifact cannot be read, parsed or written.
/// Nothing is written unless the load succeeds.
#[instrument(skip(store, classifier), fields(path = %store.path().display()))]
pub fn retag(store: &JsonStore, classifier: &TagClassifier) -> Result<RetagReport, StoreError> {
    let mut publications = store.load()?;
    for publication in &mut publications {
        publication.tags = classifier.classify(publication);
    }

    let outcome = store.persist(&publications)?;
    let distinct_tags = Catalog::new(publications).all_tags();
    info!(
        updated = outcome.written,
        tags = distinct_tags.len(),
        "publications re-tagged"
    );

    Ok(RetagReport {
        updated: outcome.written,
        distinct_tags,
        backup: outcome.backup,
    })
}

/// Result of [`migrate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateReport {
    pub found: usize,
    pub upserts: UpsertSummary,
    pub stats: PublicationStats,
    pub backup: Option<PathBuf>,
}

/// Copies every record of the artifact into the database, then backs up the
/// artifact.
///
/// # Errors
///
/// Returns [`IngestError::Write`] if the artifact cannot be read or backed up
/// and [`IngestError::Database`] if the statistics query fails. Per-record
/// upsert failures are counted in the report.
#[instrument(skip(store, repository), fields(path = %store.path().display()))]
pub async fn migrate(
    store: &JsonStore,
    repository: &PublicationRepository,
) -> Result<MigrateReport, IngestError> {
    let publications = store.load()?;
    info!(found = publications.len(), "migrating publications");

    let upserts = repository.upsert_all(&publications).await;
    let stats = repository.stats().await?;
    let backup = store.backup()?;

    Ok(MigrateReport {
        found: publications.len(),
        upserts,
        stats,
        backup,
    })
}
