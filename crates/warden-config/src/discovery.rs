//! Config file discovery and layered merging.
//!
//! Layers, lowest precedence first:
//! 1. `$WARDEN_CONFIG_DIR/config.toml`, or `config.toml` in the platform
//!    config dir (`~/.config/warden` on Linux)
//! 2. `./warden.toml`
//!
//! CLI flags are applied on top by the caller.

use std::path::{Path, PathBuf};

use crate::{ConfigError, Result, WardenConfig};

const PROJECT_CONFIG_FILE: &str = "warden.toml";
const USER_CONFIG_FILE: &str = "config.toml";
const APP_NAME: &str = "warden";

/// Overrides the user config directory when set and non-empty.
pub const CONFIG_DIR_ENV: &str = "WARDEN_CONFIG_DIR";

/// What happened to one config layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerStatus {
    /// No file at the layer's path.
    Missing,
    /// Parsed and merged.
    Loaded,
    /// Present but unreadable or malformed; see [`LoadedConfig::warnings`].
    Rejected,
}

/// A config layer that was considered during loading.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub path: PathBuf,
    pub status: LayerStatus,
}

impl ConfigSource {
    pub fn is_loaded(&self) -> bool {
        self.status == LayerStatus::Loaded
    }
}

/// A merged configuration and the layers it was built from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: WardenConfig,
    /// Every layer considered, lowest precedence first.
    pub sources: Vec<ConfigSource>,
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Load a single file, bypassing discovery. Errors are returned, not
    /// downgraded to warnings.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self {
            config: read_config(path)?,
            sources: vec![ConfigSource {
                path: path.to_path_buf(),
                status: LayerStatus::Loaded,
            }],
            warnings: Vec::new(),
        })
    }

    /// Paths of the layers that contributed to the config.
    pub fn loaded_from(&self) -> impl Iterator<Item = &Path> {
        self.sources
            .iter()
            .filter(|s| s.is_loaded())
            .map(|s| s.path.as_path())
    }
}

/// Where to look for config layers.
#[derive(Debug, Clone)]
pub struct Discovery {
    user_dir: Option<PathBuf>,
    project_dir: PathBuf,
}

impl Default for Discovery {
    fn default() -> Self {
        Self {
            user_dir: user_config_dir(),
            project_dir: PathBuf::from("."),
        }
    }
}

impl Discovery {
    /// Discovery rooted at the environment's user dir and the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the user layer from `dir` instead of the environment default.
    pub fn with_user_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_dir = Some(dir.into());
        self
    }

    /// Read the project layer from `dir` instead of the working directory.
    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = dir.into();
        self
    }

    /// Candidate layer paths, lowest precedence first.
    pub fn layer_paths(&self) -> Vec<PathBuf> {
        self.user_dir
            .iter()
            .map(|dir| dir.join(USER_CONFIG_FILE))
            .chain(std::iter::once(self.project_dir.join(PROJECT_CONFIG_FILE)))
            .collect()
    }

    /// Merge every layer that exists. Malformed layers are skipped with a warning.
    pub fn load(&self) -> LoadedConfig {
        let mut loaded = LoadedConfig {
            config: WardenConfig::new(),
            sources: Vec::new(),
            warnings: Vec::new(),
        };

        for path in self.layer_paths() {
            let status = if !path.is_file() {
                LayerStatus::Missing
            } else {
                match read_config(&path) {
                    Ok(layer) => {
                        loaded.config.merge(layer);
                        LayerStatus::Loaded
                    }
                    Err(e) => {
                        loaded
                            .warnings
                            .push(format!("Failed to load {}: {}", path.display(), e));
                        LayerStatus::Rejected
                    }
                }
            };
            loaded.sources.push(ConfigSource { path, status });
        }

        loaded
    }
}

/// Discover and merge config layers from the usual locations.
pub fn load_config() -> LoadedConfig {
    Discovery::new().load()
}

/// Parse one config file.
pub fn read_config(path: &Path) -> Result<WardenConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    WardenConfig::from_toml(&contents)
}

/// Serialize `config` to `path`, creating missing parent directories.
pub fn write_config(config: &WardenConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: parent.display().to_string(),
            source: e,
        })?;
    }
    std::fs::write(path, config.to_toml()?).map_err(|e| ConfigError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })
}

/// The user config file, if a config dir can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    user_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

fn user_config_dir() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|d| d.join(APP_NAME)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use warden_session::Lifetime;

    fn isolated(project: &TempDir, user: &TempDir) -> Discovery {
        Discovery::new()
            .with_user_dir(user.path())
            .with_project_dir(project.path())
    }

    #[test]
    fn test_user_config_path_shape() {
        if let Some(p) = user_config_path() {
            assert!(p.ends_with("config.toml"));
        }
    }

    #[test]
    fn test_read_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[session]\nlifetime = \"never\"\n").unwrap();

        let config = read_config(&path).unwrap();
        assert_eq!(
            config.session.as_ref().unwrap().lifetime,
            Some(Lifetime::Never)
        );
    }

    #[test]
    fn test_read_config_not_found() {
        let err = read_config(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_read_config_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is not valid toml {{{{").unwrap();

        let err = read_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_layer_paths_order() {
        let discovery = Discovery::new()
            .with_user_dir("/u")
            .with_project_dir("/p");
        assert_eq!(
            discovery.layer_paths(),
            vec![PathBuf::from("/u/config.toml"), PathBuf::from("/p/warden.toml")]
        );
    }

    #[test]
    fn test_no_files() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();

        let loaded = isolated(&project, &user).load();
        assert!(loaded.config.session.is_none());
        assert_eq!(loaded.loaded_from().count(), 0);
        assert!(
            loaded
                .sources
                .iter()
                .all(|s| s.status == LayerStatus::Missing)
        );
    }

    #[test]
    fn test_layered_merge() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();

        fs::write(
            user.path().join("config.toml"),
            r#"
[session]
lifetime = 120
id_length = 48

[logging]
level = "debug"
"#,
        )
        .unwrap();
        fs::write(project.path().join("warden.toml"), "[session]\nlifetime = 5\n").unwrap();

        let loaded = isolated(&project, &user).load();
        let registry = loaded.config.registry_config().unwrap();

        // Project layer overrides the lifetime only
        assert_eq!(registry.lifetime, Lifetime::from_minutes(5.0).unwrap());
        assert_eq!(registry.id_length, 48);
        assert_eq!(loaded.config.logging().level(), "debug");
        assert_eq!(loaded.loaded_from().count(), 2);
    }

    #[test]
    fn test_malformed_layer_warns_but_continues() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        fs::write(user.path().join("config.toml"), "[session]\nid_length = 12\n").unwrap();
        fs::write(
            project.path().join("warden.toml"),
            "[session]\nid_length = \"many\"\n",
        )
        .unwrap();

        let loaded = isolated(&project, &user).load();
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("Failed to load"));
        assert_eq!(loaded.sources[1].status, LayerStatus::Rejected);
        assert_eq!(loaded.config.registry_config().unwrap().id_length, 12);
    }

    #[test]
    fn test_from_file_propagates_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[session\n").unwrap();

        assert!(LoadedConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_write_and_reread() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = WardenConfig::with_defaults();
        write_config(&config, &path).unwrap();

        assert_eq!(read_config(&path).unwrap(), config);
    }
}
