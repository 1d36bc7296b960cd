//! repodoc - Repository Documentation Generator
//!
//! Fetches a repository's source, sizes it against a provider's token
//! budgets, and produces handover documentation or a README through a
//! map-reduce summarization pipeline.
//!
//! ## Core Features
//!
//! - **Bounded Fetching**: filtered GitHub tree listing and parallel raw
//!   fetches with per-file truncation, in listing order
//! - **Token Sizing**: character-based token estimates, chunking and greedy
//!   batching under input and rate budgets
//! - **Providers**: OpenAI, OpenRouter, Groq and local Ollama behind one
//!   completion client with retry and backoff
//! - **Map-Reduce**: direct single-call generation, or batch summaries
//!   composed into one document
//!
//! ## Quick Start
//!
//! ```ignore
//! use repodoc::{Config, ConfigLoader, Pipeline, SourceSpec, RepositoryReference};
//!
//! let config = ConfigLoader::load()?;
//! let pipeline = Pipeline::new(config);
//! let source = SourceSpec::Repository(
//!     RepositoryReference::parse_github_url("https://github.com/owner/name")?,
//! );
//! let scan = pipeline.scan(&source).await?;
//! let summarizer = pipeline.summarizer()?;
//! let document = pipeline.generate(&scan, &summarizer).await?;
//! println!("{}", document.markdown);
//! ```
//!
//! ## Modules
//!
//! - [`remote`]: GitHub listing, path filter, scheduler, content fetcher
//! - [`ai`]: providers, completion client, prompts, token sizing
//! - [`docgen`]: aggregation, baseline, summarizer, pipeline
//! - [`config`]: layered configuration

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod docgen;
pub mod progress;
pub mod remote;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader};
pub use types::error::{RepodocError, Result, ResultExt};
pub use types::{Batch, DocumentContext, DocumentKind, FileUnit, RepositoryReference};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use docgen::{
    GeneratedDocument, Pipeline, ScanResult, ScanStats, SourceSpec, Strategy, Summarizer,
};
pub use progress::{ProgressEvent, ProgressTracker, Stage};

// =============================================================================
// Remote and AI Re-exports
// =============================================================================

pub use ai::{CompletionClient, CompletionRequest, Provider};
pub use remote::{ContentFetcher, GithubClient, run_bounded, select_paths, should_include_path};
