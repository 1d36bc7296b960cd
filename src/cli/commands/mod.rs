//! Command handlers

pub mod config;
pub mod generate;
pub mod scan;

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::{Config, ConfigLoader};
use crate::docgen::SourceSpec;
use crate::types::{RepodocError, RepositoryReference, Result, ResultExt};

/// Load layered configuration, with `path` replacing the project file
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(RepodocError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            let global = ConfigLoader::global_config_path();
            ConfigLoader::load_layers(global.as_deref(), path)
        }
        None => ConfigLoader::load(),
    }
}

/// Exactly one of the three source flags
#[derive(Debug, Clone, Default)]
pub struct SourceArgs {
    pub repo: Option<String>,
    pub path: Option<PathBuf>,
    /// File of pasted aggregated text, or `-` for stdin
    pub input: Option<PathBuf>,
}

impl SourceArgs {
    pub fn into_spec(self) -> Result<SourceSpec> {
        match (self.repo, self.path, self.input) {
            (Some(url), None, None) => Ok(SourceSpec::Repository(
                RepositoryReference::parse_github_url(&url)?,
            )),
            (None, Some(path), None) => Ok(SourceSpec::LocalPath(path)),
            (None, None, Some(input)) => read_input(&input),
            (None, None, None) => Err(RepodocError::config(
                "No source given. Use --repo <url>, --path <dir> or --input <file|->",
            )),
            _ => Err(RepodocError::config(
                "Use only one of --repo, --path or --input",
            )),
        }
    }
}

fn read_input(input: &Path) -> Result<SourceSpec> {
    if input.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(SourceSpec::Text {
            name: "pasted source".to_string(),
            text,
        });
    }

    let text = std::fs::read_to_string(input)
        .with_context(format!("Cannot read {}", input.display()))?;
    let name = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pasted source".to_string());
    Ok(SourceSpec::Text { name, text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_source_args_repo() {
        let spec = SourceArgs {
            repo: Some("https://github.com/rust-lang/log".into()),
            ..SourceArgs::default()
        }
        .into_spec()
        .unwrap();
        match spec {
            SourceSpec::Repository(r) => assert_eq!(r.slug(), "rust-lang/log"),
            other => panic!("unexpected source: {:?}", other),
        }
    }

    #[test]
    fn test_source_args_input_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("monolith.txt");
        std::fs::write(&file, "// FILE: a.rs\nfn a() {}\n").unwrap();

        let spec = SourceArgs {
            input: Some(file),
            ..SourceArgs::default()
        }
        .into_spec()
        .unwrap();
        match spec {
            SourceSpec::Text { name, text } => {
                assert_eq!(name, "monolith");
                assert!(text.starts_with("// FILE: a.rs"));
            }
            other => panic!("unexpected source: {:?}", other),
        }
    }

    #[test]
    fn test_source_args_exclusive() {
        assert!(SourceArgs::default().into_spec().is_err());
        assert!(
            SourceArgs {
                repo: Some("https://github.com/o/r".into()),
                path: Some(".".into()),
                input: None,
            }
            .into_spec()
            .is_err()
        );
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
