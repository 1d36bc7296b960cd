//! Generate Command
//!
//! Produce a handover document or README from a repository, local directory
//! or pasted aggregated source.
//!
//! Usage:
//!   repodoc generate --repo https://github.com/owner/name [--kind readme]
//!   repodoc generate --path . --output HANDOVER.md
//!   repodoc generate --input monolith.txt --hierarchical
//!   repodoc generate --repo <url> --baseline-only

use std::path::{Path, PathBuf};

use super::{SourceArgs, load_config};
use crate::cli::ui::{ConsoleRenderer, Output};
use crate::config::Config;
use crate::docgen::{Pipeline, ScanResult};
use crate::progress::ProgressTracker;
use crate::types::{DocumentKind, Result};

/// Flags that override loaded configuration for one run
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub source: SourceArgs,
    pub config_path: Option<PathBuf>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub github_token: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
    pub max_input_tokens: Option<usize>,
    pub tpm: Option<usize>,
    pub summary_tokens: Option<usize>,
    pub hierarchical: bool,
    pub kind: Option<DocumentKind>,
    pub title: Option<String>,
    pub owner: Option<String>,
    pub context: Option<String>,
    pub output: Option<PathBuf>,
    pub baseline_only: bool,
    pub show_progress: bool,
}

impl GenerateOptions {
    /// Apply flag overrides on top of loaded configuration
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(provider) = &self.provider {
            config.llm.provider = provider.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = Some(model.clone());
        }
        if let Some(key) = &self.api_key {
            config.llm.api_key = Some(key.clone());
        }
        if let Some(token) = &self.github_token {
            config.github.token = Some(token.clone());
        }
        if let Some(t) = self.temperature {
            config.llm.temperature = t;
        }
        if let Some(n) = self.max_tokens {
            config.llm.max_tokens = n;
        }
        if let Some(n) = self.max_input_tokens {
            config.summarize.max_input_tokens = n;
        }
        if let Some(n) = self.tpm {
            config.summarize.tpm_budget = n;
        }
        if let Some(n) = self.summary_tokens {
            config.summarize.summary_tokens = n;
        }
        if self.hierarchical {
            config.summarize.force_hierarchical = true;
        }
        if let Some(kind) = self.kind {
            config.output.kind = kind;
        }
        if let Some(title) = &self.title {
            config.output.project_name = Some(title.clone());
        }
        if let Some(owner) = &self.owner {
            config.output.owner = Some(owner.clone());
        }
        if let Some(context) = &self.context {
            config.output.context = Some(context.clone());
        }
        config.validate()
    }
}

pub async fn run(options: GenerateOptions) -> Result<()> {
    let output = Output::new();

    let mut config = load_config(options.config_path.as_deref())?;
    options.apply(&mut config)?;
    let source = options.source.clone().into_spec()?;

    let tracker = ProgressTracker::new();
    let renderer = options
        .show_progress
        .then(|| ConsoleRenderer::new(tracker.clone()).spawn());
    let pipeline = Pipeline::new(config).with_progress(tracker);

    let result = generate(&pipeline, &options, source, &output).await;
    if let Some(handle) = renderer {
        handle.abort();
    }
    result
}

async fn generate(
    pipeline: &Pipeline,
    options: &GenerateOptions,
    source: crate::docgen::SourceSpec,
    output: &Output,
) -> Result<()> {
    // Fail on a missing credential before spending time on the fetch
    let summarizer = if options.baseline_only {
        None
    } else {
        Some(pipeline.summarizer()?)
    };

    let scan = pipeline.scan(&source).await?;
    report_scan(output, &scan);

    let kind = pipeline.config().output.kind;
    let Some(summarizer) = summarizer else {
        let baseline = pipeline.baseline(&scan);
        return emit(output, options.output.as_deref(), &baseline, "Baseline");
    };

    if scan.aggregated.trim().is_empty() {
        output.warning("No source content; the document will rely on context alone");
    }

    let document = pipeline.generate(&scan, &summarizer).await?;
    output.success(&format!(
        "Generated {} ({} strategy, {} batches, {} failed)",
        kind, document.strategy, document.batch_count, document.failed_batches
    ));
    emit(output, options.output.as_deref(), &document.markdown, "Document")
}

fn report_scan(output: &Output, scan: &ScanResult) {
    let stats = &scan.stats;
    output.section(&format!("Source: {}", scan.label));
    output.field("Files listed", stats.listed);
    output.field("Filtered out", stats.filtered_out);
    output.field("Over file cap", stats.capped);
    output.field("Fetched", stats.fetched);
    output.field("Failed", stats.failed);
    output.field("Truncated", stats.truncated);
    output.field("Estimated tokens", stats.estimated_tokens);
    for failure in &scan.failures {
        output.warning(&format!("Skipped {}: {}", failure.path, failure.reason));
    }
}

/// Write to `path`, or stdout when none is given
pub(crate) fn emit(output: &Output, path: Option<&Path>, text: &str, what: &str) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, text)?;
            output.success(&format!("{} written to {}", what, path.display()));
        }
        None => println!("{}", text),
    }
    Ok(())
}
