//! Client configuration
//!
//! Loaded from `slotbook.toml` in the platform config directory, or from the
//! file named by `SLOTBOOK_CONFIG`. Single keys can be overridden through
//! `SLOTBOOK_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{ActorId, CollectionId};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "SLOTBOOK_CONFIG";

const CONFIG_FILE_NAME: &str = "slotbook.toml";

fn default_commit_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Backend root, e.g. `http://localhost:8080/api`
    pub base_url: String,
    /// Collection shown by the booking view
    pub collection: CollectionId,
    /// Authenticated participant
    pub actor: ActorId,
    /// Sent verbatim as the `Authorization` header
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_commit_timeout_secs")]
    pub commit_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Config {
    /// Parse config from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load and validate a config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), "Config file read");
        Ok(config)
    }

    /// Load from the default location with environment overrides applied
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        info!(
            path = %path.display(),
            base_url = %config.base_url,
            collection = %config.collection,
            "Config loaded"
        );
        Ok(config)
    }

    /// Path of the config file to read
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(explicit));
        }

        let dirs = ProjectDirs::from("edu", "slotbook", "slotbook").ok_or_else(|| {
            Error::Config("Could not determine config directory".to_string())
        })?;
        Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Override single keys from a variable lookup (usually the environment)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SLOTBOOK_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("SLOTBOOK_COLLECTION") {
            self.collection = CollectionId::new(v);
        }
        if let Some(v) = lookup("SLOTBOOK_ACTOR") {
            self.actor = ActorId::new(v);
        }
        if let Some(v) = lookup("SLOTBOOK_AUTH_TOKEN") {
            self.auth_token = Some(v);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::Config("base_url must not be empty".to_string()));
        }
        if self.collection.as_str().trim().is_empty() {
            return Err(Error::Config("collection must not be empty".to_string()));
        }
        if self.actor.as_str().trim().is_empty() {
            return Err(Error::Config("actor must not be empty".to_string()));
        }
        if self.commit_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(Error::Config("timeouts must be at least one second".to_string()));
        }
        Ok(())
    }

    pub fn commit_timeout(&self) -> Duration {
        Duration::from_secs(self.commit_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
