use crate::error::ConfigError;
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime settings, read from an optional TOML file and then the environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base: String,
    pub connect_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub read_timeout_secs: u64,
    /// Where staged copies are written before upload
    pub scratch_dir: PathBuf,
    pub bind_addr: String,
    pub port: u16,
    /// content:// authority -> root directory
    pub authorities: HashMap<String, PathBuf>,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            connect_timeout_secs: DEFAULT_TIMEOUT_SECS,
            write_timeout_secs: DEFAULT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_TIMEOUT_SECS,
            scratch_dir: env::temp_dir().join("telegram-forwarder"),
            bind_addr: "0.0.0.0".to_string(),
            port: 8000,
            authorities: HashMap::new(),
            bot_token: None,
            chat_id: None,
        }
    }
}

impl Config {
    /// Load the config file (if any), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Reading config from {}", path.display());
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(token) = lookup("TG_BOT_TOKEN") {
            self.bot_token = Some(token);
        }
        if let Some(chat_id) = lookup("TG_CHAT_ID") {
            self.chat_id = Some(chat_id);
        }
        if let Some(api_base) = lookup("TG_API_BASE") {
            self.api_base = api_base;
        }
        if let Some(dir) = lookup("FORWARDER_SCRATCH_DIR") {
            self.scratch_dir = PathBuf::from(dir);
        }
        if let Some(port) = lookup("FORWARDER_PORT") {
            self.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "FORWARDER_PORT",
                value: port.clone(),
            })?;
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}
