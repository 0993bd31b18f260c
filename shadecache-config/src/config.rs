//! Core `Config` struct and its persistence / path helpers.

use crate::defaults;
use crate::error::ConfigError;
use crate::types::LogLevel;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Shader cache configuration, stored as YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory holding shader sources and include files.
    /// Supports `~/` for the home directory. Defaults to
    /// `~/.config/shadecache/shaders`.
    pub shaders_dir: Option<String>,

    /// Check source modification times on every lookup and rebuild stale
    /// programs. `None` means on in debug builds, off in release builds.
    pub auto_reload: Option<bool>,

    /// Debounce delay for the file watcher in milliseconds
    pub hot_reload_delay_ms: u64,

    /// Verbosity of the debug log file
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shaders_dir: None,
            auto_reload: None,
            hot_reload_delay_ms: defaults::hot_reload_delay_ms(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shader root directory
    pub fn with_shaders_dir(mut self, dir: impl Into<String>) -> Self {
        self.shaders_dir = Some(dir.into());
        self
    }

    /// Force mtime polling on or off regardless of build profile
    pub fn with_auto_reload(mut self, enabled: bool) -> Self {
        self.auto_reload = Some(enabled);
        self
    }

    /// Load the configuration from the default location.
    ///
    /// A missing file is not an error: defaults are returned.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        log::info!("Config path: {:?}", config_path);

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            log::info!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load the configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        log::info!("Loading config from {:?}", path);
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml_ng::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save the configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml_ng::to_string(self)?;

        // Atomic save: write to temp file then rename to prevent corruption on crash
        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, &yaml)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Semantic checks that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(dir) = &self.shaders_dir
            && dir.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "shaders_dir must not be empty when set".to_string(),
            ));
        }
        if self.hot_reload_delay_ms > 60_000 {
            return Err(ConfigError::Validation(format!(
                "hot_reload_delay_ms must be at most 60000, got {}",
                self.hot_reload_delay_ms
            )));
        }
        Ok(())
    }

    /// Whether lookups should poll source modification times.
    pub fn auto_reload_enabled(&self) -> bool {
        self.auto_reload.unwrap_or_else(defaults::auto_reload)
    }

    /// Get the configuration directory (using XDG convention)
    pub fn config_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            if let Some(config_dir) = dirs::config_dir() {
                config_dir.join(defaults::app_dir_name())
            } else {
                PathBuf::from(".")
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Some(home_dir) = dirs::home_dir() {
                home_dir.join(".config").join(defaults::app_dir_name())
            } else {
                PathBuf::from(".")
            }
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join(defaults::config_file_name())
    }

    /// Resolve the shader root directory.
    pub fn shaders_dir(&self) -> PathBuf {
        match &self.shaders_dir {
            Some(dir) => expand_home(dir),
            None => Self::config_dir().join(defaults::shaders_dir_name()),
        }
    }

    /// Get the full path to a file under the shader root, returning an error
    /// if the name would escape it.
    pub fn checked_shader_path(&self, shader_name: &str) -> Result<PathBuf, ConfigError> {
        validate_shader_name(shader_name)?;
        Ok(self.shaders_dir().join(shader_name))
    }
}

/// Lexically check that a relative shader name does not contain `..`
/// components and is not absolute.
///
/// The file may not exist yet, so no canonicalization is attempted.
pub fn validate_shader_name(shader_name: &str) -> Result<(), ConfigError> {
    let path = Path::new(shader_name);

    if shader_name.is_empty() {
        return Err(ConfigError::Validation("shader name is empty".to_string()));
    }

    for component in path.components() {
        match component {
            Component::ParentDir => {
                return Err(ConfigError::PathTraversal(format!(
                    "shader name '{shader_name}' contains a parent-directory component ('..') \
                     which would escape the shaders directory",
                )));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(ConfigError::PathTraversal(format!(
                    "shader name '{shader_name}' is absolute; names are relative to the shaders directory",
                )));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }

    Ok(())
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
