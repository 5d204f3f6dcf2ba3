//! The persisted artifact file.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::ArtifactError;
use crate::feature::RainfallCollection;

/// One JSON artifact on local disk, replaced wholesale on every write.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    path: PathBuf,
}

impl ArtifactStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> ArtifactError {
        ArtifactError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Replace the artifact.
    ///
    /// Written to a temp file beside the target and renamed over it, so a
    /// reader sees either the old artifact or the new one.
    pub fn write(&self, collection: &RainfallCollection) -> Result<(), ArtifactError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;

        let json = serde_json::to_vec(collection).map_err(|e| ArtifactError::Json {
            path: self.path.clone(),
            source: e,
        })?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(&json).map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        debug!(path = %self.path.display(), bytes = json.len(), "Artifact written");
        Ok(())
    }

    /// The last synced collection.
    pub fn latest(&self) -> Result<RainfallCollection, ArtifactError> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ArtifactError::NotSynced {
                    path: self.path.clone(),
                })
            }
            Err(e) => return Err(self.io_error(e)),
        };
        serde_json::from_slice(&data).map_err(|e| ArtifactError::Json {
            path: self.path.clone(),
            source: e,
        })
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn collection(filename: &str) -> RainfallCollection {
        RainfallCollection {
            type_: "FeatureCollection".to_string(),
            features: Vec::new(),
            timestamp: "2024-11-17 06:30 UTC".to_string(),
            processed_at: Utc::now(),
            filename: filename.to_string(),
        }
    }

    #[test]
    fn test_not_synced() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("rain.geojson"));
        assert!(matches!(store.latest(), Err(ArtifactError::NotSynced { .. })));
        assert!(!store.exists());
    }

    #[test]
    fn test_write_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("nested/rain.geojson"));

        store.write(&collection("first")).unwrap();
        store.write(&collection("second")).unwrap();

        assert_eq!(store.latest().unwrap().filename, "second");
        // no temp files left behind
        let entries = std::fs::read_dir(dir.path().join("nested")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_corrupt_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rain.geojson");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(matches!(
            ArtifactStore::new(path).latest(),
            Err(ArtifactError::Json { .. })
        ));
    }
}
