//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [session]
//! lifetime = 30        # minutes, or "never"
//! id_length = 64
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

use serde::{Deserialize, Serialize};
use warden_session::{Lifetime, RegistryConfig};

use crate::ConfigError;

/// Default tracing filter when none is configured.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections and fields are optional so that partial configs (e.g.,
/// project-local overrides) can be loaded and merged field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Session registry settings.
    pub session: Option<SessionConfig>,

    /// Logging settings for the CLI.
    pub logging: Option<LoggingConfig>,
}

impl WardenConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: WardenConfig) {
        if let Some(session) = other.session {
            self.session
                .get_or_insert_with(SessionConfig::default)
                .merge(session);
        }

        if let Some(logging) = other.logging {
            self.logging
                .get_or_insert_with(LoggingConfig::default)
                .merge(logging);
        }
    }

    /// Validated registry configuration, with defaults for unset fields.
    pub fn registry_config(&self) -> crate::Result<RegistryConfig> {
        self.session
            .clone()
            .unwrap_or_default()
            .to_registry_config()
    }

    /// Effective logging settings.
    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    /// A config file populated with every default, for `init`-style output.
    pub fn with_defaults() -> Self {
        let registry = RegistryConfig::default();
        Self {
            session: Some(SessionConfig {
                lifetime: Some(registry.lifetime),
                id_length: Some(registry.id_length),
            }),
            logging: Some(LoggingConfig {
                level: Some(DEFAULT_LOG_LEVEL.to_string()),
                json: Some(false),
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Session registry configuration.
///
/// ```toml
/// [session]
/// lifetime = "never"
/// id_length = 32
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Minutes a session stays valid after its last start or renewal, or `"never"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<Lifetime>,

    /// Number of characters in generated session ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_length: Option<usize>,
}

impl SessionConfig {
    fn merge(&mut self, other: SessionConfig) {
        if other.lifetime.is_some() {
            self.lifetime = other.lifetime;
        }
        if other.id_length.is_some() {
            self.id_length = other.id_length;
        }
    }

    /// Fill unset fields with defaults and validate.
    pub fn to_registry_config(&self) -> crate::Result<RegistryConfig> {
        let defaults = RegistryConfig::default();
        RegistryConfig::new(
            self.lifetime.unwrap_or(defaults.lifetime),
            self.id_length.unwrap_or(defaults.id_length),
        )
        .map_err(|source| ConfigError::Invalid {
            section: "session",
            source,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Tracing filter directive (e.g. `"info"` or `"warden_session=debug"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Emit JSON lines instead of human-readable output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

impl LoggingConfig {
    fn merge(&mut self, other: LoggingConfig) {
        if other.level.is_some() {
            self.level = other.level;
        }
        if other.json.is_some() {
            self.json = other.json;
        }
    }

    /// Effective filter directive.
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Whether to emit JSON.
    pub fn json(&self) -> bool {
        self.json.unwrap_or(false)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
