//! File units and batches
//!
//! A unit is one fetched (or chunk-derived) piece of source content. Units are
//! created once and never mutated; batches group them for a single
//! summarization call.

use serde::{Deserialize, Serialize};

use crate::ai::tokenizer::estimate_tokens;

/// Suffix separating a parent path from its chunk sequence number
pub const PART_MARKER: &str = "#part";

/// One analyzable unit of source content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUnit {
    /// Path relative to the repository root (unique within a run)
    pub path: String,
    /// Decoded text content (possibly a truncated prefix)
    pub content: String,
    /// Whether the content was cut at the byte ceiling
    pub truncated: bool,
    /// Original size in bytes, before any truncation
    pub byte_size: usize,
}

impl FileUnit {
    /// Build an untruncated unit from text
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            path: path.into(),
            byte_size: content.len(),
            content,
            truncated: false,
        }
    }

    /// Estimated token cost of the content
    pub fn estimated_tokens(&self) -> usize {
        estimate_tokens(&self.content)
    }

    /// Character count of the content
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Path of the source file this unit came from (strips `#partN`)
    pub fn source_path(&self) -> &str {
        match self.path.rfind(PART_MARKER) {
            Some(idx)
                if !self.path[idx + PART_MARKER.len()..].is_empty()
                    && self.path[idx + PART_MARKER.len()..]
                        .chars()
                        .all(|c| c.is_ascii_digit()) =>
            {
                &self.path[..idx]
            }
            _ => &self.path,
        }
    }
}

/// An ordered, non-empty group of units submitted in one call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    units: Vec<FileUnit>,
    estimated_tokens: usize,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a unit and account for its cost
    pub fn push(&mut self, unit: FileUnit) {
        self.estimated_tokens += unit.estimated_tokens();
        self.units.push(unit);
    }

    pub fn units(&self) -> &[FileUnit] {
        &self.units
    }

    pub fn into_units(self) -> Vec<FileUnit> {
        self.units
    }

    /// Sum of the per-unit estimates
    pub fn estimated_tokens(&self) -> usize {
        self.estimated_tokens
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Comma-separated paths, used in logs and failure placeholders
    pub fn paths(&self) -> String {
        self.units
            .iter()
            .map(|u| u.path.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
