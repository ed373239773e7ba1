//! Configuration system for the Warden session registry.
//!
//! Provides TOML-based configuration with:
//! - A `[session]` section producing a validated [`RegistryConfig`](warden_session::RegistryConfig)
//! - A `[logging]` section for the CLI's tracing output
//! - Config file layering (XDG user config + project-local overrides)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, Discovery, LayerStatus, LoadedConfig, load_config, read_config,
    user_config_path, write_config,
};
pub use error::{ConfigError, Result};
pub use types::*;
