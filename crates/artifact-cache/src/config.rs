//! Sync settings and the combined service configuration file.

use std::path::{Path, PathBuf};

use archive_client::ArchiveConfig;
use rain_common::{load_yaml, regions, BoundingBox, RainResult};
use serde::{Deserialize, Serialize};

/// What a sync extracts and where it writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Window serialized cell by cell
    #[serde(default = "default_reference_window")]
    pub reference_window: BoundingBox,

    /// Value of the `source` property on every feature
    #[serde(default = "default_provenance")]
    pub provenance: String,

    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,
}

fn default_reference_window() -> BoundingBox {
    regions::QUEZON_CITY_CONTEXT
}

fn default_provenance() -> String {
    "JAXA Real-time".to_string()
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from("./data/rainfall_qc.geojson")
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            reference_window: default_reference_window(),
            provenance: default_provenance(),
            artifact_path: default_artifact_path(),
        }
    }
}

/// Contents of `config/archive.yaml`: archive connection plus sync settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RainwatchConfig {
    #[serde(flatten)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub sync: SyncConfig,
}

impl RainwatchConfig {
    /// Load with `${VAR}` expansion.
    pub fn load(path: &Path) -> RainResult<Self> {
        load_yaml(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipped_config_parses() {
        let path = test_utils::workspace_config_dir().join("archive.yaml");
        let config = RainwatchConfig::load(&path).unwrap();
        assert_eq!(config.archive.layout.root, "/now/half_hour_G");
        assert_eq!(config.sync.reference_window, regions::QUEZON_CITY_CONTEXT);
        assert_eq!(config.sync.provenance, "JAXA Real-time");
    }

    #[test]
    fn test_defaults() {
        let config: RainwatchConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.archive.port, 21);
        assert_eq!(config.sync.artifact_path, PathBuf::from("./data/rainfall_qc.geojson"));
    }
}
