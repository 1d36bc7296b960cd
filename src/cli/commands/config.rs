//! Config Command
//!
//! Manage repodoc configuration.
//!
//! Usage:
//!   repodoc config show [-g] [-f json]
//!   repodoc config path
//!   repodoc config init [-g] [--force]

use std::path::Path;

use super::load_config;
use crate::cli::ui::Output;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show configuration
pub fn show(global: bool, format: &str, config_path: Option<&Path>) -> Result<()> {
    let output = Output::new();

    if global {
        match ConfigLoader::global_config_path() {
            Some(global_path) if global_path.exists() => {
                let content = std::fs::read_to_string(&global_path)?;
                println!("# Global Config: {}\n", global_path.display());
                println!("{}", content);
            }
            Some(_) => {
                output.info("No global config found.");
                output.info("Run 'repodoc config init --global' to create one.");
            }
            None => output.warning("Cannot determine global config directory."),
        }
        return Ok(());
    }

    // Merged effective config
    let config = load_config(config_path)?;
    println!("{}", ConfigLoader::render(&config, format == "json")?);
    Ok(())
}

/// Show configuration paths
pub fn path() -> Result<()> {
    println!("Configuration paths:");
    println!();

    match ConfigLoader::global_config_path() {
        Some(global) => {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        }
        None => println!("  Global:  (not available)"),
    }

    let project = ConfigLoader::project_config_path();
    let exists = if project.exists() { "✓" } else { "✗" };
    println!("  Project: {} {}", exists, project.display());
    Ok(())
}

/// Initialize global configuration
pub fn init_global(force: bool) -> Result<()> {
    let path = ConfigLoader::init_global(force)?;
    Output::new().success("Initialized global configuration");
    println!("  Config:    {}", path.display());
    Ok(())
}

/// Initialize project configuration in the current directory
pub fn init_project(force: bool) -> Result<()> {
    let root = std::env::current_dir()?;
    let project_name = root
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("project");

    let path = ConfigLoader::init_project(&root, Some(project_name), force)?;
    Output::new().success("Initialized project configuration");
    println!("  Config:    {}", path.display());
    Ok(())
}
