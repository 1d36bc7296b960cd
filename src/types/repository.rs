//! Repository references
//!
//! A [`RepositoryReference`] is parsed from user input and may point at the
//! default branch. Resolution turns it into a [`ResolvedRepository`] exactly
//! once per run, and every fetch takes the resolved form, so two fetches in
//! the same run can never observe different revisions.

use std::fmt;

use url::Url;

use super::error::{RepodocError, Result};

/// Revision requested by the user
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Revision {
    /// Whatever the remote reports as its default branch
    #[default]
    Default,
    /// An explicit branch, tag, or commit
    Named(String),
}

impl Revision {
    /// Parse a revision string; `HEAD` and empty mean the default branch
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == "HEAD" {
            Revision::Default
        } else {
            Revision::Named(value.to_string())
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::Default => write!(f, "HEAD"),
            Revision::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Unresolved pointer at a remote repository subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryReference {
    pub owner: String,
    pub repository: String,
    pub revision: Revision,
    /// Subtree to scope the listing to; empty for the whole repository
    pub sub_path: String,
}

impl RepositoryReference {
    pub fn new(owner: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repository: repository.into(),
            revision: Revision::Default,
            sub_path: String::new(),
        }
    }

    pub fn with_revision(mut self, revision: Revision) -> Self {
        self.revision = revision;
        self
    }

    pub fn with_sub_path(mut self, sub_path: impl Into<String>) -> Self {
        self.sub_path = sub_path.into();
        self
    }

    /// Parse `https://github.com/<owner>/<repo>[.git][/tree/<ref>/<path...>]`
    pub fn parse_github_url(input: &str) -> Result<Self> {
        let url = Url::parse(input.trim())
            .map_err(|e| RepodocError::InvalidReference(format!("{}: {}", input, e)))?;

        if url.host_str() != Some("github.com") {
            return Err(RepodocError::InvalidReference(format!(
                "{}: expected https://github.com/owner/repo[/tree/<ref>/<path>]",
                input
            )));
        }

        let parts: Vec<&str> = url
            .path()
            .trim_start_matches('/')
            .split('/')
            .collect();

        let owner = parts.first().copied().unwrap_or_default();
        let repository = parts.get(1).copied().map(strip_git_suffix).unwrap_or_default();

        if owner.is_empty() || repository.is_empty() {
            return Err(RepodocError::InvalidReference(format!(
                "{}: missing owner or repository",
                input
            )));
        }

        let mut reference = RepositoryReference::new(owner, repository);

        if let Some(tree_idx) = parts.iter().skip(2).position(|p| *p == "tree") {
            let tree_idx = tree_idx + 2;
            reference.revision = Revision::parse(parts.get(tree_idx + 1).copied().unwrap_or(""));
            reference.sub_path = parts
                .get(tree_idx + 2..)
                .map(|rest| rest.join("/"))
                .unwrap_or_default();
        }

        Ok(reference)
    }

    /// Pin the reference to a concrete revision
    pub fn resolve(self, revision: impl Into<String>) -> ResolvedRepository {
        ResolvedRepository {
            owner: self.owner,
            repository: self.repository,
            revision: revision.into(),
            sub_path: self.sub_path,
        }
    }

    /// `owner/repository`
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repository)
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.repository, self.revision)?;
        if !self.sub_path.is_empty() {
            write!(f, ":{}", self.sub_path)?;
        }
        Ok(())
    }
}

/// Repository pinned to a concrete revision for the rest of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRepository {
    pub owner: String,
    pub repository: String,
    pub revision: String,
    pub sub_path: String,
}

impl ResolvedRepository {
    /// `owner/repository`
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repository)
    }

    /// Sub-path with separators normalized to `/`
    pub fn normalized_sub_path(&self) -> String {
        self.sub_path.replace('\\', "/")
    }
}

fn strip_git_suffix(name: &str) -> &str {
    if name.len() > 4 && name[name.len() - 4..].eq_ignore_ascii_case(".git") {
        &name[..name.len() - 4]
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_url() {
        let r = RepositoryReference::parse_github_url("https://github.com/rust-lang/cargo").unwrap();
        assert_eq!(r.owner, "rust-lang");
        assert_eq!(r.repository, "cargo");
        assert_eq!(r.revision, Revision::Default);
        assert_eq!(r.sub_path, "");
    }

    #[test]
    fn test_parse_git_suffix() {
        let r = RepositoryReference::parse_github_url("https://github.com/o/repo.GIT").unwrap();
        assert_eq!(r.repository, "repo");
    }

    #[test]
    fn test_parse_tree_ref_and_path() {
        let r = RepositoryReference::parse_github_url(
            "https://github.com/o/r/tree/release-1.2/crates/core/src",
        )
        .unwrap();
        assert_eq!(r.revision, Revision::Named("release-1.2".into()));
        assert_eq!(r.sub_path, "crates/core/src");
    }

    #[test]
    fn test_parse_tree_without_ref() {
        let r = RepositoryReference::parse_github_url("https://github.com/o/r/tree").unwrap();
        assert_eq!(r.revision, Revision::Default);
    }

    #[test]
    fn test_repository_named_tree() {
        let r = RepositoryReference::parse_github_url("https://github.com/o/tree").unwrap();
        assert_eq!(r.repository, "tree");
        assert_eq!(r.revision, Revision::Default);
    }

    #[test]
    fn test_reject_other_hosts() {
        assert!(matches!(
            RepositoryReference::parse_github_url("https://gitlab.com/o/r"),
            Err(RepodocError::InvalidReference(_))
        ));
        assert!(RepositoryReference::parse_github_url("https://github.com/onlyowner").is_err());
        assert!(RepositoryReference::parse_github_url("not a url").is_err());
    }

    #[test]
    fn test_resolve_pins_revision() {
        let resolved = RepositoryReference::new("o", "r")
            .with_sub_path("src\\app")
            .resolve("main");
        assert_eq!(resolved.revision, "main");
        assert_eq!(resolved.normalized_sub_path(), "src/app");
        assert_eq!(resolved.slug(), "o/r");
    }

    #[test]
    fn test_display() {
        let r = RepositoryReference::new("o", "r").with_sub_path("src");
        assert_eq!(r.to_string(), "o/r@HEAD:src");
    }
}
