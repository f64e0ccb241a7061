//! Configuration types and parsing for pmig.yml

use crate::error::{CoreError, CoreResult};
use crate::plugin_name::PluginName;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Main project configuration from pmig.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Database holding both the plugin schema objects and the ledger
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Plugin name prefixes hidden from listings (e.g. host-owned chains)
    #[serde(default)]
    pub exclude_prefixes: Vec<String>,

    /// Plugins whose reverse migrations are registered from disk
    #[serde(default)]
    pub plugins: Vec<PluginConfig>,
}

/// Database connection configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// DuckDB file path, or `:memory:`
    #[serde(default)]
    pub path: Option<String>,
}

impl DatabaseConfig {
    /// The configured path, or `None` when it is missing or blank.
    pub fn usable_path(&self) -> Option<&str> {
        self.path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// One plugin entry under `plugins:`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginConfig {
    /// Plugin name as recorded in the ledger
    pub name: PluginName,

    /// Directory containing `<version>_<name>.down.sql` files
    pub path: String,
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for pmig.yml or pmig.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("pmig.yml");
        let yaml_path = dir.join("pmig.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for plugin in &self.plugins {
            if !seen.insert(plugin.name.as_str()) {
                return Err(CoreError::DuplicatePlugin {
                    name: plugin.name.to_string(),
                });
            }
            if plugin.path.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: format!("Plugin '{}' has an empty path", plugin.name),
                });
            }
        }

        Ok(())
    }

    /// Resolve each configured plugin directory against the project root
    pub fn plugin_paths_absolute(&self, root: &Path) -> Vec<(PluginName, PathBuf)> {
        self.plugins
            .iter()
            .map(|p| (p.name.clone(), root.join(&p.path)))
            .collect()
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
