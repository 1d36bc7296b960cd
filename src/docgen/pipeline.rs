//! Documentation pipeline
//!
//! Source acquisition → aggregation → baseline → summarization.
//!
//! A source is a GitHub repository, a local directory, or pasted aggregated
//! text. Each becomes a [`ScanResult`]; generation turns one into a
//! [`GeneratedDocument`] with the configured completion provider.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

use super::aggregate::{split_aggregated, to_aggregated};
use super::baseline::build_baseline;
use super::summarizer::{GeneratedDocument, SummarizeSettings, Summarizer};
use crate::ai::client::CompletionClient;
use crate::ai::tokenizer::estimate_tokens;
use crate::config::Config;
use crate::progress::ProgressTracker;
use crate::remote::{
    ContentFetcher, FailedFetch, FetchReport, GithubClient, LocalSource, PathSelection,
    select_paths,
};
use crate::types::{DocumentContext, FileUnit, RepodocError, RepositoryReference, Result};

/// Where a run's source material comes from
#[derive(Debug, Clone)]
pub enum SourceSpec {
    Repository(RepositoryReference),
    LocalPath(PathBuf),
    /// Pasted aggregated text; `name` is used as the default title
    Text { name: String, text: String },
}

/// Counts describing one scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub listed: usize,
    pub filtered_out: usize,
    pub capped: usize,
    pub fetched: usize,
    pub failed: usize,
    pub truncated: usize,
    /// Sum of original (pre-truncation) sizes
    pub total_bytes: u64,
    pub aggregated_chars: usize,
    pub estimated_tokens: usize,
}

impl ScanStats {
    fn from_parts(listed: usize, selection: &PathSelection, report: &FetchReport, aggregated: &str) -> Self {
        Self {
            listed,
            filtered_out: selection.filtered_out,
            capped: selection.capped,
            fetched: report.units.len(),
            failed: report.failures.len(),
            truncated: report.truncated_count(),
            total_bytes: report.total_bytes(),
            aggregated_chars: aggregated.chars().count(),
            estimated_tokens: estimate_tokens(aggregated),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} listed, {} filtered, {} over cap, {} fetched, {} failed, {} truncated, ~{} tokens",
            self.listed,
            self.filtered_out,
            self.capped,
            self.fetched,
            self.failed,
            self.truncated,
            self.estimated_tokens
        )
    }
}

/// Source material ready for generation
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Default document title
    pub label: String,
    /// Repository URL or local path, shown in the baseline
    pub location: Option<String>,
    pub units: Vec<FileUnit>,
    pub failures: Vec<FailedFetch>,
    pub aggregated: String,
    pub stats: ScanStats,
}

impl ScanResult {
    /// Wrap pasted aggregated text
    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let units = split_aggregated(&text);
        let stats = ScanStats {
            listed: units.len(),
            fetched: units.len(),
            total_bytes: units.iter().map(|u| u.byte_size as u64).sum(),
            aggregated_chars: text.chars().count(),
            estimated_tokens: estimate_tokens(&text),
            ..ScanStats::default()
        };
        Self {
            label: name.into(),
            location: None,
            units,
            failures: Vec::new(),
            aggregated: text,
            stats,
        }
    }
}

pub struct Pipeline {
    config: Config,
    progress: ProgressTracker,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            progress: ProgressTracker::new(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressTracker) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn scan(&self, source: &SourceSpec) -> Result<ScanResult> {
        match source {
            SourceSpec::Repository(reference) => self.scan_repository(reference.clone()).await,
            SourceSpec::LocalPath(path) => self.scan_local(path).await,
            SourceSpec::Text { name, text } => Ok(ScanResult::from_text(name.clone(), text.clone())),
        }
    }

    /// Resolve, list, filter and fetch a GitHub repository
    #[instrument(skip_all, fields(repository = %reference))]
    pub async fn scan_repository(&self, reference: RepositoryReference) -> Result<ScanResult> {
        let github = Arc::new(GithubClient::from_config(&self.config.github)?);

        let repo = github.resolve(reference).await?;
        let listed = github.list_files(&repo).await?;
        let listed_count = listed.len();
        let selection = select_paths(listed, self.config.github.max_files);

        let fetcher = ContentFetcher::new(
            github,
            self.config.github.max_bytes,
            self.config.github.concurrency,
        )
        .with_progress(self.progress.clone());
        let report = fetcher.fetch_all(&repo, selection.paths.clone()).await?;

        let aggregated = to_aggregated(&report.units);
        let stats = ScanStats::from_parts(listed_count, &selection, &report, &aggregated);
        info!("{}", stats.summary());

        Ok(ScanResult {
            label: repo.repository.clone(),
            location: Some(format!("https://github.com/{}", repo.slug())),
            units: report.units,
            failures: report.failures,
            aggregated,
            stats,
        })
    }

    /// Walk, filter and read a local directory on the blocking pool
    #[instrument(skip_all, fields(root = %root.display()))]
    pub async fn scan_local(&self, root: &Path) -> Result<ScanResult> {
        let root = root.to_path_buf();
        let max_bytes = self.config.github.max_bytes;
        let max_files = self.config.github.max_files;
        let span = tracing::Span::current();

        tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            read_local(&root, max_bytes, max_files)
        })
        .await
        .map_err(|e| RepodocError::Io(std::io::Error::other(e.to_string())))?
    }

    /// Document context from configured output metadata and the scan
    pub fn context_for(&self, scan: &ScanResult) -> DocumentContext {
        let output = &self.config.output;
        DocumentContext {
            title: output
                .project_name
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| scan.label.clone()),
            owner: output.owner.clone(),
            repository: scan.location.clone(),
            context: output.context.clone(),
        }
    }

    /// Non-AI baseline document for a scan
    pub fn baseline(&self, scan: &ScanResult) -> String {
        build_baseline(&self.context_for(scan), &scan.units)
    }

    /// Build a summarizer from the `[llm]` and `[summarize]` sections
    pub fn summarizer(&self) -> Result<Summarizer> {
        let client = CompletionClient::from_config(&self.config.llm)?;
        let model = self.config.llm.effective_model()?;
        Ok(
            Summarizer::new(client, SummarizeSettings::from_config(&self.config, model))
                .with_progress(self.progress.clone()),
        )
    }

    /// Generate the configured document kind for a scan
    pub async fn generate(
        &self,
        scan: &ScanResult,
        summarizer: &Summarizer,
    ) -> Result<GeneratedDocument> {
        let ctx = self.context_for(scan);
        let baseline = build_baseline(&ctx, &scan.units);
        summarizer
            .summarize(self.config.output.kind, &ctx, &baseline, &scan.aggregated)
            .await
    }
}

/// Synchronous directory walk behind [`Pipeline::scan_local`]
fn read_local(root: &Path, max_bytes: usize, max_files: usize) -> Result<ScanResult> {
    let source = LocalSource::new(root, max_bytes)?;
    let listed = source.list_files();
    let listed_count = listed.len();
    let selection = select_paths(listed, max_files);
    let report = source.read_all(selection.paths.clone());

    let aggregated = to_aggregated(&report.units);
    let stats = ScanStats::from_parts(listed_count, &selection, &report, &aggregated);
    info!("{}", stats.summary());

    let label = source
        .root()
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "project".to_string());

    Ok(ScanResult {
        label,
        location: Some(source.root().display().to_string()),
        units: report.units,
        failures: report.failures,
        aggregated,
        stats,
    })
}
