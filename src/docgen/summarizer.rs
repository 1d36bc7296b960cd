//! Map-reduce summarizer
//!
//! Turns aggregated source text into a finished document.
//!
//! ## Strategies
//!
//! - **Direct**: the whole source fits under the input ceiling and 80% of the
//!   tokens-per-minute budget, so one completion produces the document.
//! - **Hierarchical**: units are recovered from the aggregated text, chunked,
//!   batched, and summarized one batch at a time with a fixed pause between
//!   calls. A final composition call merges the ordered summaries.
//!
//! A failed batch is replaced by a placeholder and the run continues. A
//! failed direct or composition call ends the run.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use super::aggregate::split_aggregated;
use crate::ai::client::{CompletionClient, Delay, TokioDelay};
use crate::ai::prompt::PromptTemplates;
use crate::ai::provider::CompletionRequest;
use crate::ai::tokenizer::{
    BatchStats, batch_by_token_limit, batch_input_cap, effective_ceiling, estimate_tokens,
    item_ceiling, split_oversized_files,
};
use crate::config::Config;
use crate::constants::batching;
use crate::progress::{ProgressTracker, Stage};
use crate::types::{Batch, DocumentContext, DocumentKind, FileUnit, Result};

/// Path given to pasted text that carries no file markers
pub const PASTED_SOURCE_PATH: &str = "pasted-source";

/// How a run was summarized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Direct,
    Hierarchical,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Direct => write!(f, "direct"),
            Strategy::Hierarchical => write!(f, "hierarchical"),
        }
    }
}

/// Sizing and sampling knobs for one run
#[derive(Debug, Clone)]
pub struct SummarizeSettings {
    pub model: String,
    pub temperature: f32,
    /// Output ceiling for the direct and composition calls
    pub max_tokens: usize,
    pub max_input_tokens: usize,
    pub tpm_budget: usize,
    /// Output ceiling for each batch summary
    pub summary_tokens: usize,
    pub force_hierarchical: bool,
    pub inter_call_delay: Duration,
}

impl SummarizeSettings {
    /// Resolve settings from loaded configuration; `model` is the already
    /// resolved model name for the active provider
    pub fn from_config(config: &Config, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            max_input_tokens: config.summarize.max_input_tokens,
            tpm_budget: config.summarize.tpm_budget,
            summary_tokens: config.summarize.summary_tokens,
            force_hierarchical: config.summarize.force_hierarchical,
            inter_call_delay: Duration::from_millis(config.summarize.inter_call_delay_ms),
        }
    }

    /// Pick the strategy for an input of `estimated_tokens`
    pub fn plan(&self, estimated_tokens: usize) -> Strategy {
        let rate_cap = (self.tpm_budget as f64 * batching::TPM_DIRECT_RATIO).floor() as usize;
        if !self.force_hierarchical
            && estimated_tokens <= self.max_input_tokens
            && estimated_tokens <= rate_cap
        {
            Strategy::Direct
        } else {
            Strategy::Hierarchical
        }
    }
}

/// Final output of a summarization run
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub markdown: String,
    pub strategy: Strategy,
    /// Zero for direct runs
    pub batch_count: usize,
    pub failed_batches: usize,
}

pub struct Summarizer {
    client: CompletionClient,
    settings: SummarizeSettings,
    delay: Arc<dyn Delay>,
    progress: ProgressTracker,
}

impl Summarizer {
    pub fn new(client: CompletionClient, settings: SummarizeSettings) -> Self {
        Self {
            client,
            settings,
            delay: Arc::new(TokioDelay),
            progress: ProgressTracker::new(),
        }
    }

    /// Replace the pause used between batch calls
    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_progress(mut self, progress: ProgressTracker) -> Self {
        self.progress = progress;
        self
    }

    pub fn settings(&self) -> &SummarizeSettings {
        &self.settings
    }

    /// Produce a `kind` document from aggregated source text
    #[instrument(skip_all, fields(kind = %kind, title = %ctx.title))]
    pub async fn summarize(
        &self,
        kind: DocumentKind,
        ctx: &DocumentContext,
        baseline: &str,
        source: &str,
    ) -> Result<GeneratedDocument> {
        let estimated = estimate_tokens(source);
        let strategy = self.settings.plan(estimated);
        info!(
            estimated_tokens = estimated,
            max_input_tokens = self.settings.max_input_tokens,
            tpm_budget = self.settings.tpm_budget,
            strategy = %strategy,
            "Summarization planned"
        );

        match strategy {
            Strategy::Direct => {
                let messages = PromptTemplates::direct(kind, ctx, baseline, source);
                let markdown = self
                    .client
                    .complete(&self.request(messages, self.settings.max_tokens))
                    .await?;
                Ok(GeneratedDocument {
                    markdown,
                    strategy,
                    batch_count: 0,
                    failed_batches: 0,
                })
            }
            Strategy::Hierarchical => self.hierarchical(kind, ctx, baseline, source).await,
        }
    }

    async fn hierarchical(
        &self,
        kind: DocumentKind,
        ctx: &DocumentContext,
        baseline: &str,
        source: &str,
    ) -> Result<GeneratedDocument> {
        let batches = self.plan_batches(source);
        let (summaries, failed_batches) = self.summarize_batches(&batches).await?;

        info!(
            summaries = summaries.len(),
            failed = failed_batches,
            "Composing final document"
        );
        let messages = PromptTemplates::compose(kind, ctx, baseline, &summaries);
        let markdown = self
            .client
            .complete(&self.request(messages, self.settings.max_tokens))
            .await?;

        Ok(GeneratedDocument {
            markdown,
            strategy: Strategy::Hierarchical,
            batch_count: batches.len(),
            failed_batches,
        })
    }

    /// Recover, chunk and batch the units behind aggregated text
    pub fn plan_batches(&self, source: &str) -> Vec<Batch> {
        let mut units = split_aggregated(source);
        if units.is_empty() && !source.trim().is_empty() {
            units.push(FileUnit::new(PASTED_SOURCE_PATH, source));
        }

        let per_item = item_ceiling(self.settings.max_input_tokens);
        let input_cap = batch_input_cap(self.settings.max_input_tokens);
        let chunked = split_oversized_files(units, per_item);
        let batches = batch_by_token_limit(chunked, input_cap, self.settings.tpm_budget);

        let stats =
            BatchStats::from_batches(&batches, effective_ceiling(input_cap, self.settings.tpm_budget));
        info!(per_item_ceiling = per_item, "{}", stats.summary());
        batches
    }

    /// Summarize batches in order, one call at a time
    async fn summarize_batches(&self, batches: &[Batch]) -> Result<(Vec<String>, usize)> {
        let total = batches.len();
        self.progress.start_stage(Stage::Summarize, total);

        let mut summaries = Vec::with_capacity(total);
        let mut failed = 0;

        for (index, batch) in batches.iter().enumerate() {
            if index > 0 {
                self.delay.sleep(self.settings.inter_call_delay).await;
            }

            let paths = batch.paths();
            let messages = PromptTemplates::batch_summary(batch);
            match self
                .client
                .complete(&self.request(messages, self.settings.summary_tokens))
                .await
            {
                Ok(summary) => {
                    self.progress
                        .record_success(Stage::Summarize, index, &paths, 0);
                    info!(
                        batch = index + 1,
                        total,
                        units = batch.len(),
                        tokens = batch.estimated_tokens(),
                        "Batch summarized"
                    );
                    summaries.push(summary);
                }
                Err(err) if !err.is_isolated() => {
                    self.progress.finish_stage(Stage::Summarize);
                    return Err(err);
                }
                Err(err) => {
                    warn!(batch = index + 1, total, paths = %paths, error = %err, "Batch summary failed");
                    self.progress
                        .record_failure(Stage::Summarize, &paths, &err.to_string());
                    failed += 1;
                    summaries.push(format!("(Summary failed for {}: {})", paths, err));
                }
            }
        }

        self.progress.finish_stage(Stage::Summarize);
        Ok((summaries, failed))
    }

    fn request(
        &self,
        messages: Vec<crate::ai::provider::ChatMessage>,
        max_tokens: usize,
    ) -> CompletionRequest {
        CompletionRequest::new(self.settings.model.clone(), messages)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(max_tokens)
    }
}
