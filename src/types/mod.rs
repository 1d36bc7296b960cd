pub mod error;
pub mod repository;
pub mod unit;

pub use error::{AttemptOutcome, RepodocError, Result, ResultExt, StatusClassifier};
pub use repository::{RepositoryReference, ResolvedRepository, Revision};
pub use unit::{Batch, FileUnit, PART_MARKER};

// =============================================================================
// Domain Newtypes
// =============================================================================

use std::fmt;

/// Output document flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Handover documentation for new maintainers
    #[default]
    Handover,
    /// Project README
    Readme,
}

impl DocumentKind {
    /// Default file name for the generated document
    pub fn file_name(&self) -> &'static str {
        match self {
            DocumentKind::Handover => "HANDOVER.md",
            DocumentKind::Readme => "README.md",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Handover => write!(f, "handover"),
            DocumentKind::Readme => write!(f, "readme"),
        }
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "handover" => Ok(DocumentKind::Handover),
            "readme" => Ok(DocumentKind::Readme),
            _ => Err(format!(
                "Unknown document kind: {}. Valid values: handover, readme",
                s
            )),
        }
    }
}

/// Run-level facts passed to prompts and the baseline document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentContext {
    pub title: String,
    pub owner: Option<String>,
    /// Repository URL or local path the material came from
    pub repository: Option<String>,
    /// Free-text notes from the author
    pub context: Option<String>,
}

impl DocumentContext {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn owner_or_default(&self) -> &str {
        non_blank(self.owner.as_deref()).unwrap_or("Unassigned")
    }

    pub fn repository_or_default(&self) -> &str {
        non_blank(self.repository.as_deref()).unwrap_or("N/A")
    }

    pub fn context_or_default(&self) -> &str {
        non_blank(self.context.as_deref()).unwrap_or("None")
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
