//! Configuration Types
//!
//! All configuration structures with sensible defaults. Secrets are never
//! serialized and are redacted from `Debug` output.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ai::provider::Provider;
use crate::constants::{completion, fetch, network, retry};
use crate::types::{DocumentKind, RepodocError, Result};

const REDACTED: &str = "[redacted]";

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Repository listing and raw content settings
    pub github: GithubConfig,

    /// Completion provider settings
    pub llm: LlmConfig,

    /// Direct/hierarchical sizing
    pub summarize: SummarizeConfig,

    /// Document metadata
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            github: GithubConfig::default(),
            llm: LlmConfig::default(),
            summarize: SummarizeConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `RepodocError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(RepodocError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 || self.github.timeout_secs == 0 {
            return Err(RepodocError::config("timeout_secs must be greater than 0"));
        }

        if self.llm.max_tokens == 0 {
            return Err(RepodocError::config("llm.max_tokens must be greater than 0"));
        }

        if self.github.concurrency == 0 {
            return Err(RepodocError::config(
                "github.concurrency must be greater than 0",
            ));
        }

        if self.github.max_bytes == 0 || self.github.max_files == 0 {
            return Err(RepodocError::config(
                "github.max_bytes and github.max_files must be greater than 0",
            ));
        }

        let s = &self.summarize;
        if s.max_input_tokens == 0 || s.tpm_budget == 0 || s.summary_tokens == 0 {
            return Err(RepodocError::config(
                "summarize token budgets must be greater than 0",
            ));
        }

        self.llm.provider.parse::<Provider>()?;

        Ok(())
    }
}

// =============================================================================
// GitHub Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// REST API root
    pub api_base: String,

    /// Raw content root
    pub raw_base: String,

    /// Optional bearer token for private repositories and higher rate limits
    #[serde(skip_serializing)]
    pub token: Option<String>,

    /// Listed paths beyond this count are dropped
    pub max_files: usize,

    /// Per-file byte ceiling; longer files are truncated
    pub max_bytes: usize,

    /// In-flight raw fetches
    pub concurrency: usize,

    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: network::GITHUB_API_BASE.to_string(),
            raw_base: network::GITHUB_RAW_BASE.to_string(),
            token: None,
            max_files: fetch::DEFAULT_MAX_FILES,
            max_bytes: fetch::DEFAULT_MAX_BYTES,
            concurrency: fetch::DEFAULT_CONCURRENCY,
            timeout_secs: network::CONNECTION_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubConfig")
            .field("api_base", &self.api_base)
            .field("raw_base", &self.raw_base)
            .field("token", &self.token.as_ref().map(|_| REDACTED))
            .field("max_files", &self.max_files)
            .field("max_bytes", &self.max_bytes)
            .field("concurrency", &self.concurrency)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (openai, openrouter, groq, ollama)
    pub provider: String,

    /// Model name; the provider's default when unset
    pub model: Option<String>,

    /// Sampling temperature
    pub temperature: f32,

    /// Output ceiling for direct and composition calls
    pub max_tokens: usize,

    /// Retries after the first attempt
    pub max_retries: u32,

    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Override for the provider's base URL
    pub api_base: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAi.name().to_string(),
            model: None,
            temperature: completion::DEFAULT_TEMPERATURE,
            max_tokens: completion::DEFAULT_MAX_TOKENS,
            max_retries: retry::DEFAULT_MAX_RETRIES,
            api_key: None,
            api_base: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl LlmConfig {
    /// Configured model, or the provider's default
    pub fn effective_model(&self) -> Result<String> {
        match self.model.as_deref().map(str::trim) {
            Some(model) if !model.is_empty() => Ok(model.to_string()),
            _ => Ok(self.provider.parse::<Provider>()?.default_model().to_string()),
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// =============================================================================
// Summarize Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizeConfig {
    /// Largest input sent in one call
    pub max_input_tokens: usize,

    /// Tokens-per-minute budget shared by the run
    pub tpm_budget: usize,

    /// Output ceiling for each batch summary
    pub summary_tokens: usize,

    /// Skip the direct path even for small inputs
    pub force_hierarchical: bool,

    /// Pause between batch summary calls
    pub inter_call_delay_ms: u64,
}

impl Default for SummarizeConfig {
    fn default() -> Self {
        Self {
            max_input_tokens: 12_000,
            tpm_budget: 30_000,
            summary_tokens: 256,
            force_hierarchical: false,
            inter_call_delay_ms: crate::constants::batching::INTER_CALL_DELAY_MS,
        }
    }
}

// =============================================================================
// Output Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub kind: DocumentKind,

    /// Document title; the repository or directory name when unset
    pub project_name: Option<String>,

    pub owner: Option<String>,

    /// Free-text context passed to every prompt
    pub context: Option<String>,
}

// =============================================================================
// Tests
// =============================================================================
