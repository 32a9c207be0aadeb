use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result, anyhow};

pub const DEFAULT_SERVER: &str = "http://localhost:8000";
pub const INITIAL_PROMPT: &str = "Hello! Let's get to know each other. How can I assist you today?";

/// Overrides the configured server address
pub const SERVER_ENV_VAR: &str = "LEMONADE_SERVER_URL";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Endpoints {
    pub models: String,
    pub health: String,
    pub chat: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            models: "/v1/models".to_string(),
            health: "/v1/health".to_string(),
            chat: "/v1/chat/completions".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub server_address: String,
    pub endpoints: Endpoints,
    pub greeting: String,
    pub reset_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            server_address: DEFAULT_SERVER.to_string(),
            endpoints: Endpoints::default(),
            greeting: INITIAL_PROMPT.to_string(),
            reset_delay_ms: 100,
        }
    }

    /// Load the user config, then apply environment overrides.
    /// A missing config file is not an error.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_override(std::env::var(SERVER_ENV_VAR).ok());
        Ok(config)
    }

    /// Use the value of `LEMONADE_SERVER_URL` as the server address.
    /// Unset or blank values leave the configured address in place.
    pub fn apply_env_override(&mut self, value: Option<String>) {
        if let Some(address) = value {
            let address = address.trim();
            if !address.is_empty() {
                self.server_address = address.to_string();
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("Invalid config file {:?}", path))?;
        Ok(config)
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("lemonade-chat").join("config.json"))
    }
}
