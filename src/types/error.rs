//! Unified Error Type System
//!
//! Centralized error types for the whole pipeline, plus the classification
//! used by the completion client to decide between retrying and failing.
//!
//! ## Propagation Policy
//!
//! - **Remote**: listing/metadata failure, aborts the run
//! - **Fetch**: single file failure, the unit is dropped and the run continues
//! - **NoContent**: provider answered without usable text, fatal
//! - **ExhaustedRetries**: retry budget spent, fatal
//! - **UnknownProvider**: misconfiguration, fails before any network call

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Attempt Outcome
// =============================================================================

/// Outcome of a single completion attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Text extracted from the response envelope
    Success,
    /// Transient failure; back off and try again while budget remains
    Retryable,
    /// Permanent failure; surface immediately
    Fatal,
}

impl std::fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Retryable => write!(f, "RETRYABLE"),
            Self::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Classifies HTTP statuses returned by completion providers
pub struct StatusClassifier;

impl StatusClassifier {
    /// Classify a completion response status.
    ///
    /// 429 and 5xx are retryable against hosted providers. A local provider
    /// never gets a retry: every non-success status is fatal.
    pub fn classify(status: u16, local_provider: bool) -> AttemptOutcome {
        if (200..300).contains(&status) {
            return AttemptOutcome::Success;
        }
        if local_provider {
            return AttemptOutcome::Fatal;
        }
        match status {
            429 | 500..=599 => AttemptOutcome::Retryable,
            _ => AttemptOutcome::Fatal,
        }
    }

    /// Parse a `Retry-After` header expressed in whole seconds.
    ///
    /// HTTP-date values and garbage are ignored.
    pub fn parse_retry_after(value: &str) -> Option<Duration> {
        value.trim().parse::<u64>().ok().map(Duration::from_secs)
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum RepodocError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(String),

    // -------------------------------------------------------------------------
    // Repository Errors
    // -------------------------------------------------------------------------
    /// Listing or metadata lookup failed; nothing to process
    #[error("Remote listing failed ({status}) for {url}")]
    Remote { status: u16, url: String },

    /// A single file could not be retrieved
    #[error("Failed to fetch {path}: {reason}")]
    Fetch { path: String, reason: String },

    #[error("Invalid repository reference: {0}")]
    InvalidReference(String),

    // -------------------------------------------------------------------------
    // Completion Errors
    // -------------------------------------------------------------------------
    /// Success status but the envelope carried no text
    #[error("No AI content returned by {provider}")]
    NoContent { provider: String },

    /// Non-success status that is not worth retrying
    #[error("AI request failed ({status}) from {provider}: {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    /// Network-level failure (connect, reset, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    ExhaustedRetries { attempts: u32, last_error: String },

    #[error("Unknown provider: {0}. Supported: openai, openrouter, groq, ollama")]
    UnknownProvider(String),

    // -------------------------------------------------------------------------
    // Orchestration
    // -------------------------------------------------------------------------
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for RepodocError {
    fn from(err: reqwest::Error) -> Self {
        RepodocError::Http(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RepodocError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl RepodocError {
    /// Create a fetch error for a path
    pub fn fetch(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether a failure of this kind only affects a single unit or batch.
    ///
    /// Everything else terminates the run.
    pub fn is_isolated(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. }
                | Self::NoContent { .. }
                | Self::Api { .. }
                | Self::Transport(_)
                | Self::ExhaustedRetries { .. }
        )
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error, producing a configuration error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| RepodocError::Config(format!("{}: {}", context.into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================
