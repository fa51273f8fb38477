//! Server configuration, stored as TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// TCP port to listen on (0 = OS-assigned).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding chunk scratch space and finalized artifacts.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_port() -> u16 {
    8001
}

fn default_data_dir() -> String {
    "uploads".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or writes defaults there on
    /// first run.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Saves the current configuration to disk.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}
