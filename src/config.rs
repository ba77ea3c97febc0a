//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/catree/catree.toml`
//! 3. Local config: `<working_dir>/.catree.toml`
//! 4. Environment variables: `CATREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::services::{HierarchyOptions, DEFAULT_MAX_DEPTH, DEFAULT_SEPARATOR};
use crate::application::ApplicationError;

/// Unified configuration for catree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// JSON document holding categories and item references
    pub store_path: PathBuf,

    /// Cap on ancestor walks and tree depth (>= 1)
    pub max_depth: usize,

    /// Joiner for displayed paths
    pub path_separator: String,

    /// Creator reference stamped on new categories
    pub created_by: String,

    /// Default page size for `list`
    pub page_size: usize,

    /// Default limit for `top`
    pub top_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let created_by = std::env::var("USER").unwrap_or_else(|_| "catree".into());

        Self {
            store_path: default_store_path(),
            max_depth: DEFAULT_MAX_DEPTH,
            path_separator: DEFAULT_SEPARATOR.to_string(),
            created_by,
            page_size: 10,
            top_limit: 10,
        }
    }
}

/// Raw settings for intermediate parsing; `None` means "inherit".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub store_path: Option<PathBuf>,
    pub max_depth: Option<usize>,
    pub path_separator: Option<String>,
    pub created_by: Option<String>,
    pub page_size: Option<usize>,
    pub top_limit: Option<usize>,
}

/// Get the default store path (~/.catree/categories.json).
fn default_store_path() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".catree"))
        .unwrap_or_else(|| PathBuf::from("~/.catree"))
        .join("categories.json")
}

/// Get the XDG config directory for catree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "catree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("catree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".catree.toml")
}

/// Expand `~`, `$VAR` and `${VAR}`; unresolvable input is returned unchanged.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory searched for `.catree.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_layers(global_config_path().as_deref(), local_dir)
    }

    /// Load settings from an explicit global file and local directory.
    ///
    /// Missing files are skipped; unreadable or malformed ones fail.
    pub fn load_layers(
        global_path: Option<&Path>,
        local_dir: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(path) = global_path.filter(|p| p.exists()) {
            current = current.merge_with(&load_raw_settings(path)?);
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();
        current.validate()?;
        Ok(current)
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            store_path: overlay
                .store_path
                .clone()
                .unwrap_or_else(|| self.store_path.clone()),
            max_depth: overlay.max_depth.unwrap_or(self.max_depth),
            path_separator: overlay
                .path_separator
                .clone()
                .unwrap_or_else(|| self.path_separator.clone()),
            created_by: overlay
                .created_by
                .clone()
                .unwrap_or_else(|| self.created_by.clone()),
            page_size: overlay.page_size.unwrap_or(self.page_size),
            top_limit: overlay.top_limit.unwrap_or(self.top_limit),
        }
    }

    /// Apply CATREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("CATREE").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("store_path") {
            settings.store_path = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("path_separator") {
            settings.path_separator = val;
        }
        if let Ok(val) = config.get_string("created_by") {
            settings.created_by = val;
        }
        settings.max_depth = env_usize(&config, "max_depth", settings.max_depth)?;
        settings.page_size = env_usize(&config, "page_size", settings.page_size)?;
        settings.top_limit = env_usize(&config, "top_limit", settings.top_limit)?;

        Ok(settings)
    }

    /// Expand shell variables and tilde in the store path.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.store_path.to_string_lossy().as_ref());
        self.store_path = PathBuf::from(expanded);
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        for (key, value) in [
            ("max_depth", self.max_depth),
            ("page_size", self.page_size),
            ("top_limit", self.top_limit),
        ] {
            if value == 0 {
                return Err(ApplicationError::Config {
                    message: format!("{key} must be at least 1"),
                });
            }
        }
        Ok(())
    }

    /// Engine tunables derived from these settings.
    pub fn hierarchy_options(&self) -> HierarchyOptions {
        HierarchyOptions {
            max_depth: self.max_depth,
            path_separator: self.path_separator.clone(),
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# catree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/catree/catree.toml
#   Local:  ./.catree.toml
#   Env:    CATREE_* environment variables

# JSON document holding categories and item references
# store_path = "~/.catree/categories.json"

# Longest allowed root-to-leaf chain; walks beyond it report corruption
# max_depth = 1000

# Joiner for displayed paths
# path_separator = " > "

# Creator reference stamped on new categories (default: $USER)
# created_by = "alice"

# Defaults for `list` and `top`
# page_size = 10
# top_limit = 10
"#
        .to_string()
    }
}

fn env_usize(config: &Config, key: &str, current: usize) -> Result<usize, ApplicationError> {
    match config.get_string(key) {
        Ok(raw) => raw.trim().parse().map_err(|e| ApplicationError::Config {
            message: format!("CATREE_{}: {e}", key.to_uppercase()),
        }),
        Err(_) => Ok(current),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
