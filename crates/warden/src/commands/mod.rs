//! CLI command handlers.

pub mod config;
pub mod console;
pub mod gen_id;

use std::path::Path;

use anyhow::{Context as _, Result};
use warden_config::LoadedConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Resolved configuration and where it came from.
    pub loaded: LoadedConfig,
}

/// Load an explicit config file, or discover and merge the usual layers.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    match explicit {
        Some(path) => LoadedConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(warden_config::load_config()),
    }
}
