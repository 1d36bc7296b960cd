//! Document generation
//!
//! Aggregation, the non-AI baseline, the map-reduce summarizer and the
//! pipeline that ties them to a source.

pub mod aggregate;
pub mod baseline;
pub mod pipeline;
pub mod summarizer;

pub use aggregate::{FILE_MARKER, split_aggregated, to_aggregated};
pub use baseline::{build_baseline, render_baseline};
pub use pipeline::{Pipeline, ScanResult, ScanStats, SourceSpec};
pub use summarizer::{GeneratedDocument, Strategy, SummarizeSettings, Summarizer};
