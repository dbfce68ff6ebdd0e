//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use pubsync_core::config::DEFAULT_OUTPUT_PATH;

/// Fetch, tag and persist a researcher's ORCID publication list.
///
/// Credentials come from `ORCID_ID`, `ORCID_CLIENT_ID` and
/// `ORCID_CLIENT_SECRET`.
#[derive(Parser, Debug)]
#[command(name = "pubsync")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch works from ORCID and rewrite the publication artifact
    Fetch(FetchArgs),
    /// Recompute tags of an existing artifact with the current rules
    Retag(RetagArgs),
    /// Copy an existing artifact into a SQLite database
    Migrate(MigrateArgs),
    /// Print counts and the tag list of an artifact or database
    Stats(SourceArgs),
    /// List publications matching a term and tags
    Search(SearchArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct FetchArgs {
    /// Output artifact path
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Tag rules JSON file (built-in rules when omitted)
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Also upsert the output into this SQLite database
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Pause between work detail requests in milliseconds (300-60000)
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u64).range(300..=60000))]
    pub delay_ms: u64,

    /// Maximum attempts per request for transient failures (1-10)
    #[arg(short = 'r', long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_retries: u32,

    /// Initial retry backoff in milliseconds, doubled on each retry (max 60000)
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub backoff_ms: u64,

    /// Per-request timeout in seconds (1-600)
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..=600))]
    pub timeout_secs: u64,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RetagArgs {
    /// Artifact to re-tag in place
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Tag rules JSON file (built-in rules when omitted)
    #[arg(long)]
    pub rules: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct MigrateArgs {
    /// Artifact to copy from
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// SQLite database to copy into (created if missing)
    #[arg(long)]
    pub db: PathBuf,
}

/// Where read-only commands load publications from.
#[derive(clap::Args, Debug, Clone)]
pub struct SourceArgs {
    /// Artifact to read
    #[arg(short, long, conflicts_with = "db")]
    pub output: Option<PathBuf>,

    /// Read from this SQLite database instead of the artifact
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

impl SourceArgs {
    /// The artifact path, falling back to the default location.
    pub fn artifact_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH))
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct SearchArgs {
    /// Case-insensitive text matched against titles and authors
    #[arg(default_value = "")]
    pub term: String,

    /// Require this tag (repeatable)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    #[command(flatten)]
    pub source: SourceArgs,
}
