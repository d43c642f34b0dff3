// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Engine configuration loading
//!
//! The deserializable subset of [`InstanceOptions`]: everything except the
//! stream subscribers, which are code, not configuration. Hosts that embed
//! the bridge can keep these knobs in a YAML file alongside the rest of
//! their deployment configuration.

use crate::bridge::instance::{InstanceOptions, DEFAULT_MEMORY_CEILING_BYTES};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine bridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Use the parallel-capable engine build when the host supports it.
    pub enable_parallel: bool,
    /// Engine memory ceiling in bytes.
    pub memory_ceiling_bytes: u64,
    /// Directory holding the versioned engine build assets.
    pub asset_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_parallel: true,
            memory_ceiling_bytes: DEFAULT_MEMORY_CEILING_BYTES,
            asset_dir: PathBuf::from("assets"),
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Loads a configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Converts into creation options, with no stream subscribers attached.
    pub fn into_options(self) -> InstanceOptions {
        InstanceOptions {
            enable_parallel: self.enable_parallel,
            memory_ceiling_bytes: self.memory_ceiling_bytes,
            asset_dir: self.asset_dir,
            on_stdout: None,
            on_stderr: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let config = EngineConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.enable_parallel);
        assert_eq!(config.memory_ceiling_bytes, 2 * 1024 * 1024 * 1024);
        assert_eq!(config.asset_dir, PathBuf::from("assets"));
    }

    #[test]
    fn test_full_yaml() {
        let config = EngineConfig::from_yaml_str(
            "enable_parallel: false\nmemory_ceiling_bytes: 536870912\nasset_dir: /opt/engine\n",
        )
        .unwrap();

        assert!(!config.enable_parallel);
        assert_eq!(config.memory_ceiling_bytes, 512 * 1024 * 1024);
        assert_eq!(config.asset_dir, PathBuf::from("/opt/engine"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = EngineConfig::from_yaml_str("max_memory: 123\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_into_options_carries_values() {
        let options = EngineConfig {
            enable_parallel: false,
            memory_ceiling_bytes: 1024,
            asset_dir: PathBuf::from("/tmp/assets"),
        }
        .into_options();

        assert!(!options.enable_parallel);
        assert_eq!(options.memory_ceiling_bytes, 1024);
        assert_eq!(options.asset_dir, PathBuf::from("/tmp/assets"));
        assert!(options.on_stdout.is_none());
        assert!(options.on_stderr.is_none());
    }

    #[test]
    fn test_missing_file() {
        let result = EngineConfig::from_yaml_file("/nonexistent/bridge.yaml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
