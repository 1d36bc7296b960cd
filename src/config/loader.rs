//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/repodoc/config.toml)
//! 3. Project config (.repodoc.toml)
//! 4. Environment variables (REPODOC_* prefix, `__` between section and key)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{RepodocError, Result, ResultExt};

const ENV_PREFIX: &str = "REPODOC_";
const PROJECT_FILE: &str = ".repodoc.toml";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let global = Self::global_config_path();
        Self::load_layers(global.as_deref(), &Self::project_config_path())
    }

    /// Load from explicit global and project paths; missing files are skipped
    pub fn load_layers(global: Option<&Path>, project: &Path) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = global
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(global_path));
        }

        if project.exists() {
            debug!("Loading project config from: {}", project.display());
            figment = figment.merge(Toml::file(project));
        }

        // e.g. REPODOC_LLM__API_KEY -> llm.api_key
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| RepodocError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| RepodocError::Config(format!("Configuration error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/repodoc/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("repodoc"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(PROJECT_FILE)
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Effective configuration as TOML or JSON, secrets omitted
    pub fn render(config: &Config, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(config)?)
        } else {
            toml::to_string_pretty(config).with_context("Cannot render configuration")
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write the default global config; an existing file is kept unless `force`
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            RepodocError::Config("Cannot determine global config directory".to_string())
        })?;
        fs::create_dir_all(&global_dir)?;
        let path = global_dir.join("config.toml");
        Self::write_template(&path, &Self::default_global_config(), force)?;
        Ok(path)
    }

    /// Write the default project config into `dir`
    pub fn init_project(dir: &Path, name: Option<&str>, force: bool) -> Result<PathBuf> {
        let path = dir.join(PROJECT_FILE);
        Self::write_template(&path, &Self::default_project_config(name), force)?;
        Ok(path)
    }

    fn write_template(path: &Path, content: &str, force: bool) -> Result<()> {
        if path.exists() && !force {
            info!("Config exists: {}", path.display());
            return Ok(());
        }
        fs::write(path, content)?;
        info!("Created config: {}", path.display());
        Ok(())
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Generate default global config content (TOML)
    fn default_global_config() -> String {
        r#"# repodoc Global Configuration
# User-wide defaults. Settings in .repodoc.toml override these.
# Secrets are best supplied through the environment:
#   REPODOC_LLM__API_KEY, REPODOC_GITHUB__TOKEN

version = "1.0"

[llm]
provider = "openai"
# model = "gpt-4o-mini"
temperature = 0.2
max_tokens = 2048
max_retries = 3
timeout_secs = 300

[summarize]
max_input_tokens = 12000
tpm_budget = 30000
summary_tokens = 256
"#
        .to_string()
    }

    /// Generate default project config content (TOML)
    fn default_project_config(name: Option<&str>) -> String {
        let project_name = name.unwrap_or("project");
        format!(
            r#"# repodoc Project Configuration
# Project-specific settings that override global defaults.

version = "1.0"

[output]
kind = "handover"
project_name = "{}"
# owner = "team-name"
# context = "What this service is for"

[github]
max_files = 200
max_bytes = 200000
concurrency = 4
"#,
            project_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentKind;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_without_files() {
        let dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_layers(None, &dir.path().join(PROJECT_FILE)).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.summarize.summary_tokens, 256);
    }

    #[test]
    fn test_project_overrides_global() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join(PROJECT_FILE);
        fs::write(
            &global,
            "[llm]\nprovider = \"groq\"\nmax_retries = 5\n[summarize]\ntpm_budget = 6000\n",
        )
        .unwrap();
        fs::write(&project, "[summarize]\ntpm_budget = 9000\n").unwrap();

        let config = ConfigLoader::load_layers(Some(&global), &project).unwrap();
        assert_eq!(config.llm.provider, "groq");
        assert_eq!(config.llm.max_retries, 5);
        assert_eq!(config.summarize.tpm_budget, 9000);
    }

    #[test]
    fn test_env_override_with_underscored_key() {
        let dir = TempDir::new().unwrap();
        // SAFETY: no other test reads this variable
        unsafe {
            std::env::set_var("REPODOC_OUTPUT__OWNER", "platform-team");
        }
        let config = ConfigLoader::load_layers(None, &dir.path().join(PROJECT_FILE)).unwrap();
        unsafe {
            std::env::remove_var("REPODOC_OUTPUT__OWNER");
        }
        assert_eq!(config.output.owner.as_deref(), Some("platform-team"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[llm]\ntemperature = 3.0\n").unwrap();
        assert!(matches!(
            ConfigLoader::load_from_file(&path),
            Err(RepodocError::Config(_))
        ));
    }

    #[test]
    fn test_init_project_template_loads() {
        let dir = TempDir::new().unwrap();
        let path = ConfigLoader::init_project(dir.path(), Some("billing"), false).unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.output.project_name.as_deref(), Some("billing"));
        assert_eq!(config.output.kind, DocumentKind::Handover);

        fs::write(&path, "# edited").unwrap();
        ConfigLoader::init_project(dir.path(), None, false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "# edited");
    }

    #[test]
    fn test_global_template_parses() {
        let parsed: Config = toml::from_str(&ConfigLoader::default_global_config()).unwrap();
        assert_eq!(parsed.llm.provider, "openai");
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_render_omits_secrets() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-hidden".into());
        let toml = ConfigLoader::render(&config, false).unwrap();
        let json = ConfigLoader::render(&config, true).unwrap();
        assert!(toml.contains("[llm]"));
        assert!(!toml.contains("sk-hidden"));
        assert!(!json.contains("sk-hidden"));
    }
}
