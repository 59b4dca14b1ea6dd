use serde::{Deserialize, Serialize};
use shulker_common::{Result, ShulkerError, Version};
use shulker_logger::LogSeverity;
use std::path::PathBuf;

/// Loader settings, read from a JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Version assumed for chunks written before data versions existed.
    pub fallback_version: Version,
    /// Decode every chunk as this version, whatever it declares.
    pub force_version: Option<Version>,
    /// JSON block table replacing the built-in 1.12.2 one. Chunks written
    /// by 1.13 or later name blocks by their flattened names
    /// (`minecraft:grass_block`), which only a table listing those names
    /// resolves.
    pub registry: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            fallback_version: Version::PRE_15W32A,
            force_version: None,
            registry: None,
            log_level: None,
        }
    }
}

impl LoaderConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The version a chunk is decoded as, given its `DataVersion` if any.
    pub fn resolve_version(&self, data_version: Option<i32>) -> Version {
        match (self.force_version, data_version) {
            (Some(forced), _) => forced,
            (None, Some(data)) => Version::from_data_version(data),
            (None, None) => self.fallback_version,
        }
    }

    pub fn log_severity(&self) -> Result<Option<LogSeverity>> {
        self.log_level
            .as_deref()
            .map(|level| {
                level.parse::<LogSeverity>().map_err(|_| {
                    ShulkerError::ConfigError(format!("unknown log level {:?}", level))
                })
            })
            .transpose()
    }
}
