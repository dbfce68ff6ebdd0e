//! End-to-end ingestion run.
//!
//! Token, works listing, then one detail fetch per work strictly in sequence
//! with a fixed pause between fetches. A failed work is skipped; a failed
//! token or listing aborts the run before the artifact is touched (apart from
//! creating an empty one on first run).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::error::{IngestError, RecordError};
use crate::http::Sleeper;
use crate::normalize::normalize;
use crate::orcid::{AccessToken, RawWorkSummary, WorkSource};
use crate::publication::{Publication, finalize};
use crate::repository::{PublicationRepository, UpsertSummary};
use crate::store::JsonStore;
use crate::tags::TagClassifier;

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Works listed by the provider.
    pub total: usize,
    /// Works fetched and normalized.
    pub succeeded: usize,
    /// Works skipped after a per-work failure.
    pub skipped: usize,
    /// Records written after dedup.
    pub written: usize,
    /// Backup of the previous artifact, if any.
    pub backup: Option<PathBuf>,
    /// Database upsert counts when a repository is attached.
    pub database: Option<UpsertSummary>,
}

/// One ingestion run over a [`WorkSource`].
pub struct Pipeline {
    source: Arc<dyn WorkSource>,
    classifier: TagClassifier,
    store: JsonStore,
    sleeper: Arc<dyn Sleeper>,
    request_delay: Duration,
    repository: Option<PublicationRepository>,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        source: Arc<dyn WorkSource>,
        classifier: TagClassifier,
        store: JsonStore,
        sleeper: Arc<dyn Sleeper>,
        request_delay: Duration,
    ) -> Self {
        Self {
            source,
            classifier,
            store,
            sleeper,
            request_delay,
            repository: None,
        }
    }

    /// Also upserts the run's output into the relational backend.
    #[must_use]
    pub fn with_repository(mut self, repository: PublicationRepository) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Runs the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Auth`] when no token is obtained, the listing's
    /// error when enumeration fails, and [`IngestError::Write`] when the
    /// artifact cannot be written. Per-work failures are counted, not returned.
    #[instrument(skip(self), fields(output = %self.store.path().display()))]
    pub async fn run(&self) -> Result<IngestReport, IngestError> {
        let Some(token) = self.source.acquire_token().await else {
            self.bootstrap_after_failure();
            return Err(IngestError::auth("no access token obtained"));
        };

        let summaries = match self.source.list_works(&token).await {
            Ok(summaries) => summaries,
            Err(error) => {
                self.bootstrap_after_failure();
                return Err(error);
            }
        };

        let total = summaries.len();
        info!(total, "works listed");

        let mut publications = Vec::with_capacity(total);
        let mut skipped = 0;
        for (index, summary) in summaries.iter().enumerate() {
            if index > 0 {
                self.sleeper.sleep(self.request_delay).await;
            }
            let position = index + 1;
            match self.process(summary, &token).await {
                Ok(publication) => {
                    info!(position, total, title = %publication.title, "processed work");
                    publications.push(publication);
                }
                Err(error) => {
                    warn!(position, total, work = %error.work_id(), error = %error, "skipping work");
                    skipped += 1;
                }
            }
        }

        let succeeded = publications.len();
        let publications = finalize(publications);
        let outcome = self.store.persist(&publications)?;

        let database = match &self.repository {
            Some(repository) => Some(repository.upsert_all(&publications).await),
            None => None,
        };

        info!(
            succeeded,
            skipped,
            written = outcome.written,
            "ingestion complete"
        );

        Ok(IngestReport {
            total,
            succeeded,
            skipped,
            written: outcome.written,
            backup: outcome.backup,
            database,
        })
    }

    async fn process(
        &self,
        summary: &RawWorkSummary,
        token: &AccessToken,
    ) -> Result<Publication, RecordError> {
        let detail = self.source.fetch_detail(summary, token).await?;
        let mut publication = normalize(summary, &detail)?;
        publication.tags = self.classifier.classify(&publication);
        Ok(publication)
    }

    fn bootstrap_after_failure(&self) {
        if let Err(error) = self.store.bootstrap_if_missing() {
            warn!(error = %error, "could not create empty artifact");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::http::{FetchError, RecordingSleeper};
    use crate::orcid::{RawWorkDetail, StringValue, TitleBlock};
    use crate::store::StoreError;
    use crate::tags::TagRules;
    use async_trait::async_trait;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeSource {
        no_token: bool,
        listing_fails: bool,
        works: Vec<(u64, Option<&'static str>)>,
        failing: Vec<u64>,
    }

    #[async_trait]
    impl WorkSource for FakeSource {
        async fn acquire_token(&self) -> Option<AccessToken> {
            (!self.no_token).then(|| AccessToken::new("token"))
        }

        async fn list_works(
            &self,
            _token: &AccessToken,
        ) -> Result<Vec<RawWorkSummary>, IngestError> {
            if self.listing_fails {
                return Err(IngestError::unexpected_format("fake://works", "no group"));
            }
            Ok(self
                .works
                .iter()
                .map(|(code, title)| RawWorkSummary {
                    put_code: Some(*code),
                    title: title.map(|t| TitleBlock {
                        title: Some(StringValue {
                            value: Some(t.to_string()),
                        }),
                    }),
                    ..RawWorkSummary::default()
                })
                .collect())
        }

        async fn fetch_detail(
            &self,
            summary: &RawWorkSummary,
            _token: &AccessToken,
        ) -> Result<RawWorkDetail, RecordError> {
            let code = summary.put_code.unwrap();
            if self.failing.contains(&code) {
                return Err(RecordError::Fetch {
                    work_id: code.to_string(),
                    source: FetchError::http_status("fake://work", 404),
                });
            }
            Ok(RawWorkDetail::default())
        }
    }

    fn pipeline(source: FakeSource, dir: &TempDir, sleeper: &RecordingSleeper) -> Pipeline {
        Pipeline::new(
            Arc::new(source),
            TagClassifier::new(&TagRules::default()),
            JsonStore::new(dir.path().join("publications.json")),
            Arc::new(sleeper.clone()),
            Duration::from_millis(500),
        )
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_other_works() {
        let dir = TempDir::new().unwrap();
        let sleeper = RecordingSleeper::new();
        let source = FakeSource {
            works: vec![(1, Some("First")), (2, Some("Second")), (3, Some("Third"))],
            failing: vec![2],
            ..FakeSource::default()
        };

        let report = pipeline(source, &dir, &sleeper).run().await.unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.skipped, 1);

        let titles: Vec<String> = JsonStore::new(dir.path().join("publications.json"))
            .load()
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["First", "Third"]);
    }

    #[tokio::test]
    async fn test_missing_title_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let sleeper = RecordingSleeper::new();
        let source = FakeSource {
            works: vec![(1, None), (2, Some("Kept"))],
            ..FakeSource::default()
        };

        let report = pipeline(source, &dir, &sleeper).run().await.unwrap();
        assert_eq!((report.succeeded, report.skipped, report.written), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_delay_between_detail_fetches() {
        let dir = TempDir::new().unwrap();
        let sleeper = RecordingSleeper::new();
        let source = FakeSource {
            works: vec![(1, Some("A")), (2, Some("B")), (3, Some("C"))],
            ..FakeSource::default()
        };

        pipeline(source, &dir, &sleeper).run().await.unwrap();
        assert_eq!(sleeper.sleeps(), vec![Duration::from_millis(500); 2]);
    }

    #[tokio::test]
    async fn test_auth_failure_preserves_existing_artifact() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("publications.json"));
        store
            .persist(&[Publication::titled("One"), Publication::titled("Two")])
            .unwrap();
        let before = std::fs::read(store.path()).unwrap();

        let sleeper = RecordingSleeper::new();
        let source = FakeSource {
            no_token: true,
            ..FakeSource::default()
        };
        let err = pipeline(source, &dir, &sleeper).run().await.unwrap_err();

        assert!(matches!(err, IngestError::Auth { .. }));
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
        assert_eq!(store.load().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unwritable_output_is_write_error() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("publications.json");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep.txt"), "kept").unwrap();

        let sleeper = RecordingSleeper::new();
        let source = FakeSource {
            works: vec![(1, Some("Unsaved"))],
            ..FakeSource::default()
        };
        let err = pipeline(source, &dir, &sleeper).run().await.unwrap_err();

        assert!(matches!(err, IngestError::Write(StoreError::Io { .. })));
        assert_eq!(
            std::fs::read_to_string(target.join("keep.txt")).unwrap(),
            "kept"
        );
    }

    #[tokio::test]
    async fn test_listing_failure_bootstraps_empty_artifact_on_first_run() {
        let dir = TempDir::new().unwrap();
        let sleeper = RecordingSleeper::new();
        let source = FakeSource {
            listing_fails: true,
            ..FakeSource::default()
        };
        let err = pipeline(source, &dir, &sleeper).run().await.unwrap_err();

        assert!(matches!(err, IngestError::UnexpectedFormat { .. }));
        let store = JsonStore::new(dir.path().join("publications.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_runs_write_identical_artifacts() {
        let dir = TempDir::new().unwrap();
        let sleeper = RecordingSleeper::new();
        let works = vec![(1, Some("Brain networks")), (2, Some("Media effects"))];
        let path = dir.path().join("publications.json");

        pipeline(
            FakeSource {
                works: works.clone(),
                ..FakeSource::default()
            },
            &dir,
            &sleeper,
        )
        .run()
        .await
        .unwrap();
        let first = std::fs::read(&path).unwrap();

        let report = pipeline(
            FakeSource {
                works,
                ..FakeSource::default()
            },
            &dir,
            &sleeper,
        )
        .run()
        .await
        .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), first);
        assert!(report.backup.is_some());
    }

    #[tokio::test]
    async fn test_output_is_tagged() {
        let dir = TempDir::new().unwrap();
        let sleeper = RecordingSleeper::new();
        let source = FakeSource {
            works: vec![(1, Some("An fMRI study"))],
            ..FakeSource::default()
        };
        pipeline(source, &dir, &sleeper).run().await.unwrap();

        let saved = JsonStore::new(dir.path().join("publications.json"))
            .load()
            .unwrap();
        assert!(saved[0].tags.contains("fMRI"));
        assert!(saved[0].tags.contains("Neuroimaging"));
        // Journal sentinel matches the "Preprint" rule.
        assert!(saved[0].tags.contains("Preprint"));
    }
}
