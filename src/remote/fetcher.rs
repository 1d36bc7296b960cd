//! Content fetcher
//!
//! Retrieves raw file content through the bounded scheduler and turns it into
//! [`FileUnit`]s. Content beyond the byte ceiling is cut and flagged; the unit
//! keeps the original size. A failed file is logged and dropped.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::github::GithubClient;
use super::scheduler::run_bounded;
use crate::constants::fetch;
use crate::progress::{ProgressTracker, Stage};
use crate::types::{FileUnit, ResolvedRepository, Result};

/// A file that could not be retrieved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFetch {
    pub path: String,
    pub reason: String,
}

/// Result of fetching a path list
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    /// Successfully fetched units, in listing order
    pub units: Vec<FileUnit>,
    pub failures: Vec<FailedFetch>,
}

impl FetchReport {
    pub fn truncated_count(&self) -> usize {
        self.units.iter().filter(|u| u.truncated).count()
    }

    /// Sum of original (pre-truncation) sizes
    pub fn total_bytes(&self) -> u64 {
        self.units.iter().map(|u| u.byte_size as u64).sum()
    }
}

/// Decode at most `max_bytes` of `bytes` as text.
///
/// Returns the text and whether anything was cut. A multi-byte character
/// split by the cut is dropped; other invalid sequences become U+FFFD.
pub fn decode_prefix(bytes: &[u8], max_bytes: usize) -> (String, bool) {
    let truncated = bytes.len() > max_bytes;
    let slice = if truncated { &bytes[..max_bytes] } else { bytes };

    let text = match std::str::from_utf8(slice) {
        Ok(s) => s.to_string(),
        Err(e) if truncated && e.error_len().is_none() => {
            String::from_utf8_lossy(&slice[..e.valid_up_to()]).into_owned()
        }
        Err(_) => String::from_utf8_lossy(slice).into_owned(),
    };

    (text, truncated)
}

/// Build a unit from raw bytes under a byte ceiling
pub fn unit_from_bytes(path: impl Into<String>, bytes: &[u8], max_bytes: usize) -> FileUnit {
    let (content, truncated) = decode_prefix(bytes, max_bytes);
    FileUnit {
        path: path.into(),
        content,
        truncated,
        byte_size: bytes.len(),
    }
}

/// Progress is logged every few finished items and at the last one,
/// counting failures as finished
fn is_progress_checkpoint(done: usize, total: usize) -> bool {
    done > 0 && (done % fetch::PROGRESS_EVERY == 0 || done == total)
}

/// Parallel raw-content fetcher
pub struct ContentFetcher {
    github: Arc<GithubClient>,
    max_bytes: usize,
    concurrency: usize,
    progress: ProgressTracker,
}

impl ContentFetcher {
    pub fn new(github: Arc<GithubClient>, max_bytes: usize, concurrency: usize) -> Self {
        Self {
            github,
            max_bytes,
            concurrency,
            progress: ProgressTracker::new(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressTracker) -> Self {
        self.progress = progress;
        self
    }

    /// Fetch one path into a unit
    pub async fn fetch_one(&self, repo: &ResolvedRepository, path: &str) -> Result<FileUnit> {
        let bytes = self.github.fetch_raw(repo, path).await?;
        let unit = unit_from_bytes(path, &bytes, self.max_bytes);

        if unit.truncated {
            warn!(
                path,
                original_bytes = unit.byte_size,
                max_bytes = self.max_bytes,
                "Truncated file"
            );
        }
        Ok(unit)
    }

    /// Fetch every path with bounded parallelism, preserving listing order
    #[instrument(skip_all, fields(repository = %repo.slug(), files = paths.len()))]
    pub async fn fetch_all(
        &self,
        repo: &ResolvedRepository,
        paths: Vec<String>,
    ) -> Result<FetchReport> {
        let total = paths.len();
        self.progress.start_stage(Stage::Fetch, total);

        let outcomes = run_bounded(self.concurrency, paths, move |path, index| async move {
            let outcome = self.fetch_one(repo, &path).await;
            match &outcome {
                Ok(unit) => {
                    self.progress.record_success(
                        Stage::Fetch,
                        index,
                        &path,
                        unit.byte_size as u64,
                    );
                }
                Err(err) => {
                    warn!(path = %path, error = %err, "Skipping file");
                    self.progress
                        .record_failure(Stage::Fetch, &path, &err.to_string());
                }
            }

            let snapshot = self.progress.snapshot();
            if is_progress_checkpoint(snapshot.done(), total) {
                info!(
                    path = %path,
                    index,
                    done = snapshot.done(),
                    fetched = snapshot.completed,
                    failed = snapshot.failed,
                    total,
                    bytes = snapshot.bytes,
                    "Fetch progress"
                );
            }
            (path, outcome)
        })
        .await?;

        self.progress.finish_stage(Stage::Fetch);

        let mut report = FetchReport::default();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(unit) => report.units.push(unit),
                Err(err) => report.failures.push(FailedFetch {
                    path,
                    reason: err.to_string(),
                }),
            }
        }

        info!(
            fetched = report.units.len(),
            failed = report.failures.len(),
            truncated = report.truncated_count(),
            "Fetch complete"
        );
        Ok(report)
    }
}
