//! Application configuration management.
//!
//! This module handles loading and saving the client configuration,
//! which names the record store endpoint, its anonymous key, and an
//! optional cache directory override.
//!
//! Configuration is stored at `~/.config/orderdesk/config.json`.
//! Environment variables (`ORDERDESK_STORE_URL`, `ORDERDESK_ANON_KEY`)
//! take precedence over the file, and a `.env` file is honored when
//! present.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "orderdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const STORE_URL_VAR: &str = "ORDERDESK_STORE_URL";
const ANON_KEY_VAR: &str = "ORDERDESK_ANON_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub store_url: Option<String>,
    pub anon_key: Option<String>,
    pub cache_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };

        if let Ok(url) = std::env::var(STORE_URL_VAR) {
            config.store_url = Some(url);
        }
        if let Ok(key) = std::env::var(ANON_KEY_VAR) {
            config.anon_key = Some(key);
        }
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Endpoint and key for the record store, or an error naming the
    /// missing setting.
    pub fn store_settings(&self) -> Result<(String, String)> {
        let url = self
            .store_url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("Missing store_url (set {} or edit {})", STORE_URL_VAR, CONFIG_FILE))?;
        let key = self
            .anon_key
            .clone()
            .ok_or_else(|| anyhow::anyhow!("Missing anon_key (set {} or edit {})", ANON_KEY_VAR, CONFIG_FILE))?;
        Ok((url, key))
    }
}
