//! Config Command
//!
//! Manage coursegen configuration.
//!
//! Usage:
//!   coursegen config show [-f json]
//!   coursegen config path
//!   coursegen config init [-g] [--force]

use std::path::Path;

use crate::config::ConfigLoader;
use crate::types::Result;

/// Show the effective (merged) configuration
pub fn show(config_path: Option<&Path>, format: &str) -> Result<()> {
    let config = ConfigLoader::load_with(config_path)?;
    println!("{}", ConfigLoader::render_config(&config, format == "json")?);
    Ok(())
}

/// Show configuration paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

/// Initialize global configuration
pub fn init_global(force: bool) -> Result<()> {
    let path = ConfigLoader::init_global(force)?;
    println!("✓ Initialized global configuration");
    println!("  Config: {}", path.display());
    Ok(())
}

/// Initialize project configuration
pub fn init_project(force: bool) -> Result<()> {
    let path = ConfigLoader::init_project(force)?;
    println!("✓ Initialized project configuration");
    println!("  Config: {}", path.display());
    Ok(())
}
