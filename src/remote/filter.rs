//! Path filter
//!
//! Pure, content-independent predicate applied to listed paths before any
//! fetch, followed by a deterministic cap on the number of paths.

use tracing::debug;

/// Binary, media, font and source-map extensions
const REJECTED_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico", ".pdf", ".zip", ".gz", ".mp4", ".mov",
    ".webm", ".wav", ".mp3", ".aac", ".ttf", ".woff", ".woff2", ".eot", ".map",
];

/// Directories rejected at any depth
const REJECTED_DIRS_ANYWHERE: &[&str] = &["node_modules", "dist", "build"];

/// Directories rejected only at the repository root
const REJECTED_DIRS_AT_ROOT: &[&str] = &[".git", "vendor"];

/// Lockfile basenames (lowercase)
const REJECTED_LOCKFILES: &[&str] = &[
    "yarn.lock",
    "package-lock.json",
    "pnpm-lock.yaml",
    "poetry.lock",
    "cargo.lock",
    "gemfile.lock",
    "go.sum",
];

const MINIFIED_SUFFIXES: &[&str] = &[".min.js", ".min.css"];

/// Whether a listed path is worth fetching
pub fn should_include_path(path: &str) -> bool {
    let lower = path.replace('\\', "/").to_lowercase();

    if REJECTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return false;
    }
    if MINIFIED_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix)) {
        return false;
    }

    let mut segments: Vec<&str> = lower.split('/').collect();
    let basename = segments.pop().unwrap_or_default();

    if REJECTED_LOCKFILES.contains(&basename) {
        return false;
    }
    if let Some(root) = segments.first()
        && REJECTED_DIRS_AT_ROOT.contains(root)
    {
        return false;
    }
    if segments.iter().any(|s| REJECTED_DIRS_ANYWHERE.contains(s)) {
        return false;
    }

    true
}

/// Paths kept after filtering and capping, with the counts of what was dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSelection {
    pub paths: Vec<String>,
    /// Rejected by [`should_include_path`]
    pub filtered_out: usize,
    /// Accepted but beyond the cap
    pub capped: usize,
}

/// Filter `listed` and keep the first `max_files` survivors in listing order
pub fn select_paths(listed: Vec<String>, max_files: usize) -> PathSelection {
    let total = listed.len();
    let mut accepted: Vec<String> = listed
        .into_iter()
        .filter(|p| should_include_path(p))
        .collect();
    let filtered_out = total - accepted.len();

    let capped = accepted.len().saturating_sub(max_files);
    accepted.truncate(max_files);

    debug!(
        listed = total,
        filtered_out,
        capped,
        kept = accepted.len(),
        "Selected paths"
    );

    PathSelection {
        paths: accepted,
        filtered_out,
        capped,
    }
}
