use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use anisync_api::mal::client::DEFAULT_SEARCH_LIMIT;

use crate::error::ConfigError;
use crate::models::{LibraryFolder, UserSyncPreferences};

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level sync configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub mal: MalConfig,
    #[serde(default)]
    pub libraries: Vec<LibraryFolder>,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MalConfig {
    pub client_id: Option<String>,
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
}

fn default_search_limit() -> u32 {
    DEFAULT_SEARCH_LIMIT
}

/// One host user and how their playback is synced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub user_id: String,
    pub access_token: Option<String>,
    #[serde(default)]
    pub plan_to_watch_only: bool,
    #[serde(default)]
    pub rewatch_completed: bool,
    #[serde(default)]
    pub library_scope: Vec<String>,
}

impl UserConfig {
    pub fn preferences(&self) -> UserSyncPreferences {
        UserSyncPreferences {
            library_scope: self.library_scope.clone(),
            plan_to_watch_only: self.plan_to_watch_only,
            rewatch_completed: self.rewatch_completed,
        }
    }
}

impl SyncConfig {
    /// Load the user config file if it exists, otherwise the built-in defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            Self::load_from(&user_path)
        } else {
            Ok(toml::from_str(DEFAULT_CONFIG)?)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", "anisync")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    pub fn user(&self, user_id: &str) -> Option<&UserConfig> {
        self.users.iter().find(|u| u.user_id == user_id)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}
