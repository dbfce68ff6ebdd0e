//! Fetch command handler: run the ingestion pipeline.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use pubsync_core::http::Sleeper;
use pubsync_core::tags::load_rules;
use pubsync_core::{
    ConfigError, Database, IngestConfig, JsonStore, OrcidClient, Pipeline, PublicationRepository,
    RetryPolicy, TagClassifier, TokioSleeper,
};
use tracing::{debug, info};

use crate::cli::FetchArgs;
use crate::output;

pub async fn run_fetch_command(args: &FetchArgs) -> Result<()> {
    let config = build_config(args, |name| std::env::var(name).ok())?;
    debug!(?config, "configuration resolved");

    let rules = load_rules(args.rules.as_deref()).context("failed to load tag rules")?;
    let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);
    let store = JsonStore::new(config.output_path.clone());
    let request_delay = config.request_delay;

    let client =
        OrcidClient::new(config, Arc::clone(&sleeper)).context("failed to build HTTP client")?;
    let mut pipeline = Pipeline::new(
        Arc::new(client),
        TagClassifier::new(&rules),
        store,
        sleeper,
        request_delay,
    );

    if let Some(db_path) = &args.db {
        let db = Database::new(db_path)
            .await
            .with_context(|| format!("failed to open database {}", db_path.display()))?;
        info!(path = %db_path.display(), "mirroring output to database");
        pipeline = pipeline.with_repository(PublicationRepository::new(&db));
    }

    let report = pipeline.run().await?;
    output::print_lines(&output::ingest_report_lines(&report, &args.output));
    Ok(())
}

/// Environment first, then CLI overrides. Fails before any network call.
fn build_config(
    args: &FetchArgs,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<IngestConfig, ConfigError> {
    let retry = RetryPolicy::new(args.max_retries, Duration::from_millis(args.backoff_ms));
    let config = IngestConfig::from_lookup(lookup)?
        .with_request_delay(Duration::from_millis(args.delay_ms))?
        .with_request_timeout(Duration::from_secs(args.timeout_secs))?
        .with_retry(retry)
        .with_output_path(args.output.clone());
    Ok(config)
}
