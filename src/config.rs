use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    /// Outstanding requests are abandoned after this long so the send
    /// control never stays disabled indefinitely.
    pub request_timeout_secs: u64,
    /// How long a terminal upload status stays on screen before clearing.
    pub upload_clear_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout_secs: 60,
            upload_clear_secs: 5,
        }
    }
}

impl Config {
    /// Load from the config file, writing the defaults there on first run
    /// so users have a file to edit. `RAGCHAT_URL` overrides the configured
    /// backend URL either way (and is never persisted).
    pub fn load() -> Result<Self> {
        let mut config = Self::load_or_init(&Self::config_path()?)?;
        if let Ok(url) = std::env::var("RAGCHAT_URL") {
            if !url.is_empty() {
                config.backend_url = url;
            }
        }
        Ok(config)
    }

    fn load_or_init(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("ragchat"))
    }
}
