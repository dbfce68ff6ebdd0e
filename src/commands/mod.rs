//! CLI command handlers.

mod fetch;
mod migrate;
mod query;
mod retag;

pub use fetch::run_fetch_command;
pub use migrate::run_migrate_command;
pub use query::{run_search_command, run_stats_command};
pub use retag::run_retag_command;
