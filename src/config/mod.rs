//! Configuration module

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

/// Session defaults managed by the `settings` command
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Location assumed when an interactive sighting entry leaves it blank
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    0
}

impl Config {
    /// Load config from default locations
    pub fn load() -> Result<Self> {
        // Try local config first, then global
        if let Some(local) = Self::find_local_config() {
            return Self::load_from(&local);
        }

        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                return Self::load_from(&global);
            }
        }

        Ok(Self::default())
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Save back to whichever config file is in effect, creating the
    /// global one when none exists yet.
    pub fn save(&self) -> Result<()> {
        let path = Self::find_local_config()
            .or_else(Self::global_config_path)
            .unwrap_or_else(|| PathBuf::from(".wildlog").join("config.toml"));
        self.save_to(&path)
    }

    /// Find local .wildlog/config.toml walking up directories
    pub fn find_local_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let config_path = current.join(".wildlog").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Find local .wildlog/wildlog.db walking up directories
    pub fn find_local_db() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let db_path = current.join(".wildlog").join("wildlog.db");
            if db_path.exists() {
                return Some(db_path);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Get global config path (~/.wildlog/config.toml)
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".wildlog").join("config.toml"))
    }

    /// Get global database path (~/.wildlog/wildlog.db)
    pub fn global_db_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".wildlog").join("wildlog.db"))
    }

    /// Get database path with priority:
    /// 1. WILDLOG_DATABASE env var
    /// 2. Local .wildlog/wildlog.db (walking up from CWD)
    /// 3. Global ~/.wildlog/wildlog.db
    pub fn database_path(&self) -> PathBuf {
        if let Ok(env_path) = std::env::var("WILDLOG_DATABASE") {
            return PathBuf::from(env_path);
        }

        if let Some(local_db) = Self::find_local_db() {
            return local_db;
        }

        if let Some(local_config) = Self::find_local_config() {
            return local_config.parent().unwrap().join("wildlog.db");
        }

        if let Some(global) = Self::global_db_path() {
            return global;
        }

        PathBuf::from(".wildlog").join("wildlog.db")
    }

    /// Command history file lives next to the database.
    pub fn history_path(&self) -> PathBuf {
        let db = self.database_path();
        db.parent()
            .map(|p| p.join("history.txt"))
            .unwrap_or_else(|| PathBuf::from("history.txt"))
    }
}

/// Helper to get directories crate functionality
mod dirs {
    use std::path::PathBuf;

    pub fn home_dir() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            std::env::var("USERPROFILE").ok().map(PathBuf::from)
        }
        #[cfg(not(windows))]
        {
            std::env::var("HOME").ok().map(PathBuf::from)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let config = Config {
            defaults: DefaultsConfig {
                location: Some("Bagley Wood".to_string()),
            },
            display: DisplayConfig { page_size: 25 },
        };

        let text = toml::to_string_pretty(&config).unwrap();
        let reloaded: Config = toml::from_str(&text).unwrap();
        assert_eq!(reloaded.defaults.location.as_deref(), Some("Bagley Wood"));
        assert_eq!(reloaded.display.page_size, 25);
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.defaults.location.is_none());
        assert_eq!(config.display.page_size, 0);
    }
}
