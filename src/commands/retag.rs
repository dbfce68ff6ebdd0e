//! Retag command handler.

use anyhow::{Context, Result};
use pubsync_core::tags::load_rules;
use pubsync_core::{JsonStore, TagClassifier, retag};

use crate::cli::RetagArgs;
use crate::output;

pub fn run_retag_command(args: &RetagArgs) -> Result<()> {
    let rules = load_rules(args.rules.as_deref()).context("failed to load tag rules")?;
    let store = JsonStore::new(args.output.clone());
    let report = retag(&store, &TagClassifier::new(&rules))?;
    output::print_lines(&output::retag_report_lines(&report));
    Ok(())
}
