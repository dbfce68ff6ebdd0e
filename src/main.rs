//! CLI entry point for pubsync.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use pubsync_core::{ConfigError, IngestError};
use tracing::{debug, error};

mod cli;
mod commands;
mod output;

use cli::{Args, Command};

/// Process outcome, mapped to the exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessExit {
    Success,
    /// The run failed; any prior artifact is left as it was.
    Failure,
    /// Credentials or settings were missing or invalid. Nothing was fetched.
    Configuration,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Failure => ExitCode::from(1),
            ProcessExit::Configuration => ExitCode::from(2),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    init_tracing(default_log_level(args.verbose, args.quiet));
    debug!(?args, "CLI arguments parsed");

    let exit = match dispatch(&args.command).await {
        Ok(()) => ProcessExit::Success,
        Err(err) => {
            error!("{err:#}");
            exit_for_error(&err)
        }
    };
    exit.into()
}

async fn dispatch(command: &Command) -> Result<()> {
    match command {
        Command::Fetch(fetch_args) => commands::run_fetch_command(fetch_args).await,
        Command::Retag(retag_args) => commands::run_retag_command(retag_args),
        Command::Migrate(migrate_args) => commands::run_migrate_command(migrate_args).await,
        Command::Stats(source_args) => commands::run_stats_command(source_args).await,
        Command::Search(search_args) => commands::run_search_command(search_args).await,
    }
}

/// Priority: `RUST_LOG` > quiet flag > verbose flag > default (info).
fn default_log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr; stdout carries the command's report.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_for_error(err: &anyhow::Error) -> ProcessExit {
    let is_configuration = err.chain().any(|cause| {
        cause.is::<ConfigError>()
            || matches!(
                cause.downcast_ref::<IngestError>(),
                Some(IngestError::Configuration(_))
            )
    });
    if is_configuration {
        ProcessExit::Configuration
    } else {
        ProcessExit::Failure
    }
}
