/*!
Reading the (optional) configuration file.
*/

use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_derive::Deserialize;

use crate::filter::Shift;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Error reading file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Error parsing file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("tick_ms must be at least 1 (got {0})")]
    BadInterval(u64),
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: i32,
    pub height: i32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 650,
            title: "Pixel Editor Pro".to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Milliseconds between animation ticks.
    pub tick_ms: u64,
    pub log_level: String,
    pub shift: Shift,
    pub window: WindowConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_ms: 120,
            log_level: "info".to_owned(),
            shift: Shift::default(),
            window: WindowConfig::default(),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn load<P: AsRef<Path>>(fname: P) -> Result<Config, ConfigError> {
        let fname = fname.as_ref();
        let toml_string = read_to_string(fname).map_err(|e| ConfigError::Read {
            path: fname.to_path_buf(),
            source: e,
        })?;

        let cfg = Config::from_toml(&toml_string).map_err(|e| ConfigError::Parse {
            path: fname.to_path_buf(),
            source: e,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::BadInterval(self.tick_ms));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}
