//! Migrate command handler: copy the JSON artifact into SQLite.

use anyhow::{Context, Result};
use pubsync_core::{Database, JsonStore, PublicationRepository, migrate};

use crate::cli::MigrateArgs;
use crate::output;

pub async fn run_migrate_command(args: &MigrateArgs) -> Result<()> {
    let db = Database::new(&args.db)
        .await
        .with_context(|| format!("failed to open database {}", args.db.display()))?;
    let repository = PublicationRepository::new(&db);
    let store = JsonStore::new(args.output.clone());

    let report = migrate(&store, &repository).await?;
    output::print_lines(&output::migrate_report_lines(&report));
    db.close().await;
    Ok(())
}
