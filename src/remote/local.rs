//! Local directory source
//!
//! Walks a working tree with `ignore` (honouring `.gitignore`) and produces
//! the same unit sequence a remote fetch would: filtered, capped, truncated.

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::fetcher::{FailedFetch, FetchReport, unit_from_bytes};
use crate::types::{FileUnit, RepodocError, Result};

pub struct LocalSource {
    root: PathBuf,
    max_bytes: usize,
}

impl LocalSource {
    pub fn new<P: AsRef<Path>>(root: P, max_bytes: usize) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(RepodocError::Config(format!(
                "Not a directory: {}",
                root.display()
            )));
        }
        Ok(Self { root, max_bytes })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative file paths with `/` separators, sorted
    pub fn list_files(&self) -> Vec<String> {
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false)
            .follow_links(false) // Security: prevent symlink traversal attacks
            .filter_entry(|entry| entry.file_name() != ".git")
            .build();

        let mut files: Vec<String> = walker
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .filter_map(|entry| {
                entry
                    .path()
                    .strip_prefix(&self.root)
                    .ok()
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
            })
            .collect();

        files.sort();
        info!(root = %self.root.display(), files = files.len(), "Scanned directory");
        files
    }

    /// Read one relative path into a unit
    pub fn read_unit(&self, path: &str) -> Result<FileUnit> {
        let bytes = std::fs::read(self.root.join(path))
            .map_err(|e| RepodocError::fetch(path, e.to_string()))?;
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

    /// Read every path, dropping unreadable files
    pub fn read_all(&self, paths: Vec<String>) -> FetchReport {
        let mut report = FetchReport::default();
        for path in paths {
            match self.read_unit(&path) {
                Ok(unit) => report.units.push(unit),
                Err(err) => {
                    warn!(path = %path, error = %err, "Skipping file");
                    report.failures.push(FailedFetch {
                        path,
                        reason: err.to_string(),
                    });
                }
            }
        }
        report
    }
}
