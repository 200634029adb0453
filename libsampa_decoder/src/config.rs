use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::ConfigError;

/// Structure representing the application configuration. Contains the input
/// path, decode limits and the elink mask.
/// Configs are serializable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub input_path: PathBuf,
    /// Bits set here mark elinks whose data is dropped (bit 0 = elink 0).
    pub elink_mask: u64,
    /// Stop after this many DATE events; 0 means no limit.
    pub max_events: u64,
    /// Stop after this many GBT words; 0 means no limit.
    pub max_gbt_words: u64,
    /// Print every decoded packet instead of only counting them.
    pub dump_packets: bool,
}

impl Default for Config {
    /// Generate a new Config object. All fields will be empty/invalid
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("None"),
            elink_mask: 0,
            max_events: 0,
            max_gbt_words: 0,
            dump_packets: false,
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    pub fn is_event_limit_reached(&self, nevents: u64) -> bool {
        self.max_events > 0 && nevents >= self.max_events
    }

    pub fn is_gbt_limit_reached(&self, ngbt: u64) -> bool {
        self.max_gbt_words > 0 && ngbt >= self.max_gbt_words
    }
}
