//! Scan Command
//!
//! Fetch a repository or local tree and write the aggregated source without
//! calling any completion provider.
//!
//! Usage:
//!   repodoc scan --repo https://github.com/owner/name > monolith.txt
//!   repodoc scan --path . --output monolith.txt
//!   repodoc scan --repo <url> --stats-only

use std::path::PathBuf;

use super::generate::emit;
use super::{SourceArgs, load_config};
use crate::cli::ui::{ConsoleRenderer, Output};
use crate::docgen::{Pipeline, ScanResult};
use crate::progress::ProgressTracker;
use crate::types::Result;

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub source: SourceArgs,
    pub config_path: Option<PathBuf>,
    pub github_token: Option<String>,
    pub max_files: Option<usize>,
    pub max_bytes: Option<usize>,
    pub concurrency: Option<usize>,
    pub output: Option<PathBuf>,
    pub stats_only: bool,
    pub show_progress: bool,
}

pub async fn run(options: ScanOptions) -> Result<()> {
    let output = Output::new();

    let mut config = load_config(options.config_path.as_deref())?;
    if let Some(token) = &options.github_token {
        config.github.token = Some(token.clone());
    }
    if let Some(n) = options.max_files {
        config.github.max_files = n;
    }
    if let Some(n) = options.max_bytes {
        config.github.max_bytes = n;
    }
    if let Some(n) = options.concurrency {
        config.github.concurrency = n;
    }
    config.validate()?;

    let tracker = ProgressTracker::new();
    let renderer = options
        .show_progress
        .then(|| ConsoleRenderer::new(tracker.clone()).spawn());
    let pipeline = Pipeline::new(config).with_progress(tracker);

    let scanned = pipeline.scan(&options.source.clone().into_spec()?).await;
    if let Some(handle) = renderer {
        handle.abort();
    }
    let scan = scanned?;

    print_stats(&output, &scan);
    if options.stats_only {
        return Ok(());
    }
    emit(&output, options.output.as_deref(), &scan.aggregated, "Aggregated source")
}

fn print_stats(output: &Output, scan: &ScanResult) {
    let stats = &scan.stats;
    output.section(&format!("Scan: {}", scan.label));
    if let Some(location) = &scan.location {
        output.field("Location", location);
    }
    output.field("Files listed", stats.listed);
    output.field("Filtered out", stats.filtered_out);
    output.field("Over file cap", stats.capped);
    output.field("Fetched", stats.fetched);
    output.field("Failed", stats.failed);
    output.field("Truncated", stats.truncated);
    output.field("Original bytes", stats.total_bytes);
    output.field("Characters", stats.aggregated_chars);
    output.field("Estimated tokens", stats.estimated_tokens);

    for failure in &scan.failures {
        output.warning(&format!("Skipped {}: {}", failure.path, failure.reason));
    }
    if stats.capped > 0 {
        output.info(&format!(
            "{} files beyond the cap were not fetched (raise github.max_files)",
            stats.capped
        ));
    }
}
