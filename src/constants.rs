//! Global Constants
//!
//! Centralized constants for sizing, retry, and network tuning.
//! Every load-bearing number in the pipeline is defined here.

/// Token estimation constants
pub mod tokens {
    /// Characters per estimated token
    pub const CHARS_PER_TOKEN: usize = 4;
}

/// Chunking constants (oversized single units)
pub mod chunking {
    /// Smallest slice a unit is ever cut into (characters)
    pub const MIN_SLICE_CHARS: usize = 4000;

    /// Fraction of the token ceiling used for a slice
    pub const SLICE_FILL_RATIO: f64 = 0.9;
}

/// Batching and summarization constants
pub mod batching {
    /// Fraction of the tokens-per-minute budget usable by one batch
    pub const TPM_BATCH_RATIO: f64 = 0.7;

    /// Fraction of the tokens-per-minute budget a direct call may use
    pub const TPM_DIRECT_RATIO: f64 = 0.8;

    /// Per-item chunk ceiling as a fraction of max input tokens
    pub const ITEM_CEILING_RATIO: f64 = 0.5;

    /// Batch input cap as a fraction of max input tokens
    pub const BATCH_INPUT_RATIO: f64 = 0.8;

    /// Floor for both derived ceilings
    pub const MIN_DERIVED_CEILING: usize = 2000;

    /// Pause between sequential batch summary calls (milliseconds)
    pub const INTER_CALL_DELAY_MS: u64 = 400;
}

/// Completion retry constants
pub mod retry {
    /// Base delay after a retryable HTTP status (milliseconds)
    pub const STATUS_BASE_DELAY_MS: u64 = 1000;

    /// Base delay after a transport failure (milliseconds)
    pub const TRANSPORT_BASE_DELAY_MS: u64 = 800;

    /// Symmetric jitter applied to status backoff (fraction of the delay)
    pub const JITTER_RATIO: f64 = 0.1;

    /// Default retry budget
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
}

/// Completion defaults
pub mod completion {
    /// Temperature when none is configured
    pub const DEFAULT_TEMPERATURE: f32 = 0.2;

    /// Output ceiling when none is configured
    pub const DEFAULT_MAX_TOKENS: usize = 2048;

    /// Hosted model used when none is configured
    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

    /// Local model used when none is configured
    pub const DEFAULT_LOCAL_MODEL: &str = "llama3.1";
}

/// Repository fetch constants
pub mod fetch {
    /// Maximum paths fetched per run
    pub const DEFAULT_MAX_FILES: usize = 200;

    /// Per-file byte ceiling
    pub const DEFAULT_MAX_BYTES: usize = 200_000;

    /// Parallel fetches in flight
    pub const DEFAULT_CONCURRENCY: usize = 4;

    /// Emit a progress log every N completed fetches
    pub const PROGRESS_EVERY: usize = 10;

    /// Branch assumed when metadata omits `default_branch`
    pub const FALLBACK_BRANCH: &str = "main";
}

/// HTTP/Network constants
pub mod network {
    /// GitHub REST API base
    pub const GITHUB_API_BASE: &str = "https://api.github.com";

    /// GitHub raw content base
    pub const GITHUB_RAW_BASE: &str = "https://raw.githubusercontent.com";

    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;

    /// User agent sent on every request
    pub const USER_AGENT: &str = concat!("repodoc/", env!("CARGO_PKG_VERSION"));
}
