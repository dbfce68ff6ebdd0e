//! Read-only commands over the artifact or the database: stats and search.

use anyhow::{Context, Result};
use pubsync_core::{Catalog, Database, JsonStore, Publication, PublicationRepository};
use serde::Serialize;

use crate::cli::{SearchArgs, SourceArgs};
use crate::output;

/// Where publications are read from.
enum Source {
    Artifact(Catalog),
    Database(PublicationRepository),
}

impl Source {
    async fn open(args: &SourceArgs) -> Result<Self> {
        if let Some(db_path) = &args.db {
            let db = Database::new(db_path)
                .await
                .with_context(|| format!("failed to open database {}", db_path.display()))?;
            return Ok(Self::Database(PublicationRepository::new(&db)));
        }
        let store = JsonStore::new(args.artifact_path());
        Ok(Self::Artifact(Catalog::new(store.load()?)))
    }
}

#[derive(Serialize)]
struct StatsView<'a> {
    #[serde(flatten)]
    stats: &'a pubsync_core::PublicationStats,
    tag_names: &'a [String],
}

pub async fn run_stats_command(args: &SourceArgs) -> Result<()> {
    let (stats, tags) = match Source::open(args).await? {
        Source::Artifact(catalog) => (catalog.stats(), catalog.all_tags()),
        Source::Database(repository) => (repository.stats().await?, repository.all_tags().await?),
    };

    if args.json {
        let view = StatsView {
            stats: &stats,
            tag_names: &tags,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        output::print_lines(&output::stats_lines(&stats, &tags));
    }
    Ok(())
}

pub async fn run_search_command(args: &SearchArgs) -> Result<()> {
    let matches: Vec<Publication> = match Source::open(&args.source).await? {
        Source::Artifact(catalog) => catalog
            .search(&args.term, &args.tags)
            .into_iter()
            .cloned()
            .collect(),
        Source::Database(repository) => repository.search(&args.term, &args.tags).await?,
    };

    if args.source.json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!("No publications match.");
        return Ok(());
    }
    let width = output::terminal_width();
    for publication in &matches {
        println!("{}", output::publication_row(publication, width));
    }
    println!("{} match(es)", matches.len());
    Ok(())
}
