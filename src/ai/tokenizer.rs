//! Token Estimation, Chunking and Batching
//!
//! Every sizing decision in the pipeline goes through [`estimate_tokens`]:
//! `ceil(chars / 4)`. The chunker and the batcher both rely on it, so it must
//! not be replaced by a smarter tokenizer in one place only.
//!
//! ## Strategy
//! - Split any unit above the per-item ceiling into fixed-size character slices
//! - Pack units greedily, in order, under an effective per-batch ceiling
//! - Admit a single oversized unit as its own batch instead of failing

use tracing::debug;

use crate::constants::{batching, chunking, tokens};
use crate::types::{Batch, FileUnit, PART_MARKER};

/// Estimate the token cost of a string: `ceil(chars / 4)`
pub fn estimate_tokens(text: &str) -> usize {
    estimate_tokens_from_chars(text.chars().count())
}

/// Estimate the token cost of a character count
pub fn estimate_tokens_from_chars(chars: usize) -> usize {
    chars.div_ceil(tokens::CHARS_PER_TOKEN)
}

/// Slice length used when splitting a unit that exceeds `max_tokens_per_item`
pub fn slice_chars_for(max_tokens_per_item: usize) -> usize {
    let scaled = (max_tokens_per_item as f64
        * tokens::CHARS_PER_TOKEN as f64
        * chunking::SLICE_FILL_RATIO)
        .floor() as usize;
    scaled.max(chunking::MIN_SLICE_CHARS)
}

/// Effective per-batch ceiling: the stricter of the input cap and 70% of the
/// tokens-per-minute budget
pub fn effective_ceiling(max_input_tokens: usize, tpm_budget: usize) -> usize {
    let rate_share = (tpm_budget as f64 * batching::TPM_BATCH_RATIO).floor() as usize;
    max_input_tokens.min(rate_share)
}

/// Per-item chunk ceiling used by the hierarchical summarizer
pub fn item_ceiling(max_input_tokens: usize) -> usize {
    let scaled = (max_input_tokens as f64 * batching::ITEM_CEILING_RATIO).floor() as usize;
    scaled.max(batching::MIN_DERIVED_CEILING)
}

/// Batch input cap used by the hierarchical summarizer
pub fn batch_input_cap(max_input_tokens: usize) -> usize {
    let scaled = (max_input_tokens as f64 * batching::BATCH_INPUT_RATIO).floor() as usize;
    scaled.max(batching::MIN_DERIVED_CEILING)
}

// =============================================================================
// Chunker
// =============================================================================

/// Split units whose estimate exceeds `max_tokens_per_item`.
///
/// Units under the ceiling pass through untouched and keep their position.
/// Oversized units become contiguous, non-overlapping character slices named
/// `<path>#part<N>` (1-based). Slice boundaries ignore content structure.
pub fn split_oversized_files(units: Vec<FileUnit>, max_tokens_per_item: usize) -> Vec<FileUnit> {
    let slice_chars = slice_chars_for(max_tokens_per_item);
    let mut out = Vec::with_capacity(units.len());

    for unit in units {
        let estimate = unit.estimated_tokens();
        if estimate <= max_tokens_per_item {
            out.push(unit);
            continue;
        }

        debug!(
            path = %unit.path,
            tokens = estimate,
            slice_chars,
            "Chunking large file"
        );

        let chars: Vec<char> = unit.content.chars().collect();
        for (idx, slice) in chars.chunks(slice_chars).enumerate() {
            let content: String = slice.iter().collect();
            out.push(FileUnit {
                path: format!("{}{}{}", unit.path, PART_MARKER, idx + 1),
                byte_size: content.len(),
                content,
                truncated: unit.truncated,
            });
        }
    }

    out
}

// =============================================================================
// Batcher
// =============================================================================

/// Pack units into batches under `min(max_input_tokens, floor(tpm_budget * 0.7))`.
///
/// Greedy and order-preserving: a unit joins the open batch if the sum stays
/// within the ceiling, otherwise the batch is closed and a new one started.
/// A unit that alone exceeds the ceiling gets a batch of its own.
pub fn batch_by_token_limit(
    units: Vec<FileUnit>,
    max_input_tokens: usize,
    tpm_budget: usize,
) -> Vec<Batch> {
    let ceiling = effective_ceiling(max_input_tokens, tpm_budget);
    let mut batches = Vec::new();
    let mut current = Batch::new();

    for unit in units {
        let cost = unit.estimated_tokens();

        if current.estimated_tokens() + cost > ceiling && !current.is_empty() {
            batches.push(std::mem::take(&mut current));
        }

        if cost > ceiling && current.is_empty() {
            debug!(path = %unit.path, tokens = cost, ceiling, "Singleton overflow batch");
            let mut single = Batch::new();
            single.push(unit);
            batches.push(single);
        } else {
            current.push(unit);
        }
    }

    if !current.is_empty() {
        batches.push(current);
    }

    batches
}

/// Statistics about batching results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub batch_count: usize,
    pub total_units: usize,
    pub total_tokens: usize,
    pub avg_tokens_per_batch: usize,
    pub max_batch_tokens: usize,
    pub singleton_overflows: usize,
}

impl BatchStats {
    /// Compute statistics for a batch plan against its ceiling
    pub fn from_batches(batches: &[Batch], ceiling: usize) -> Self {
        if batches.is_empty() {
            return Self::default();
        }

        let total_units = batches.iter().map(Batch::len).sum();
        let total_tokens: usize = batches.iter().map(Batch::estimated_tokens).sum();

        Self {
            batch_count: batches.len(),
            total_units,
            total_tokens,
            avg_tokens_per_batch: total_tokens / batches.len(),
            max_batch_tokens: batches
                .iter()
                .map(Batch::estimated_tokens)
                .max()
                .unwrap_or(0),
            singleton_overflows: batches
                .iter()
                .filter(|b| b.len() == 1 && b.estimated_tokens() > ceiling)
                .count(),
        }
    }

    /// Format as a human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "{} batches, {} units, {} tokens (avg {}/batch)",
            self.batch_count, self.total_units, self.total_tokens, self.avg_tokens_per_batch
        )
    }
}
