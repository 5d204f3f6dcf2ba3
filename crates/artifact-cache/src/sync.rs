//! One-shot sync: resolve one snapshot, serialize its reference window,
//! replace the artifact.

use archive_client::{
    ArchiveClient, ArchiveConfig, ArchiveConnector, ArchiveLayout, ArchiveTransport, StagingArea,
};
use chrono::Utc;
use gsmap_parser::decode_compressed;
use metrics::counter;
use rain_common::SnapshotId;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::SyncConfig;
use crate::error::{ArtifactError, Result};
use crate::feature::{build_collection, RainfallCollection};
use crate::store::ArtifactStore;
use crate::target::SyncTarget;

/// What a successful sync wrote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncSummary {
    pub snapshot: SnapshotId,
    /// `YYYY-MM-DD HH:MM UTC`
    pub timestamp: String,
    pub filename: String,
    pub features: usize,
    pub max_intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Error => "error",
        }
    }
}

/// `{status, message}` as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub status: SyncStatus,
    pub message: String,
}

impl From<&Result<SyncSummary>> for SyncOutcome {
    fn from(result: &Result<SyncSummary>) -> Self {
        match result {
            Ok(summary) => SyncOutcome {
                status: SyncStatus::Success,
                message: format!(
                    "synced {} ({} cells, max {:.2} mm/h)",
                    summary.timestamp, summary.features, summary.max_intensity
                ),
            },
            Err(e) => SyncOutcome {
                status: SyncStatus::Error,
                message: e.to_string(),
            },
        }
    }
}

/// Owns the artifact and knows how to refresh it from the archive.
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    config: SyncConfig,
    layout: ArchiveLayout,
    staging: StagingArea,
    store: ArtifactStore,
}

impl ArtifactCache {
    pub fn new(config: SyncConfig, layout: ArchiveLayout, staging: StagingArea) -> Self {
        let store = ArtifactStore::new(config.artifact_path.clone());
        Self {
            config,
            layout,
            staging,
            store,
        }
    }

    pub fn from_config(archive: &ArchiveConfig, sync: SyncConfig) -> Self {
        Self::new(
            sync,
            archive.layout.clone(),
            StagingArea::new(archive.staging_dir.clone()),
        )
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// The last synced collection, or [`ArtifactError::NotSynced`].
    pub fn latest(&self) -> std::result::Result<RainfallCollection, ArtifactError> {
        self.store.latest()
    }

    /// Resolve `target`, extract the reference window and replace the artifact.
    ///
    /// On any error the previous artifact is left untouched.
    #[instrument(skip(self, connector, target), fields(endpoint = %connector.endpoint(), sync_target = %target))]
    pub fn sync<C: ArchiveConnector>(&self, connector: &C, target: SyncTarget) -> Result<SyncSummary> {
        let result = self.sync_inner(connector, target);
        let outcome = SyncOutcome::from(&result);
        counter!("rainfall_syncs_total", "status" => outcome.status.as_str()).increment(1);

        match &result {
            Ok(summary) => info!(
                file = %summary.filename,
                features = summary.features,
                max_intensity = summary.max_intensity,
                "Sync complete"
            ),
            Err(e) => error!(kind = e.kind().as_str(), error = %e, "Sync failed"),
        }
        result
    }

    fn sync_inner<C: ArchiveConnector>(&self, connector: &C, target: SyncTarget) -> Result<SyncSummary> {
        let mut client = ArchiveClient::open(connector, self.layout.clone(), self.staging.clone())?;
        let result = self.extract(&mut client, target);
        client.close();

        let (snapshot, collection) = result?;
        self.store.write(&collection)?;

        Ok(SyncSummary {
            snapshot,
            timestamp: collection.timestamp.clone(),
            filename: collection.filename.clone(),
            features: collection.features.len(),
            max_intensity: collection.max_intensity(),
        })
    }

    fn extract<T: ArchiveTransport>(
        &self,
        client: &mut ArchiveClient<T>,
        target: SyncTarget,
    ) -> Result<(SnapshotId, RainfallCollection)> {
        let (dir, snapshot) = target.resolve(client)?;
        info!(dir = %dir, file = %snapshot.filename, "Sync target resolved");

        let data = client.fetch(&dir, &snapshot.filename)?;
        let grid = decode_compressed(&data)?;

        let collection = build_collection(
            &grid,
            &snapshot,
            &self.config.reference_window,
            &self.config.provenance,
            Utc::now(),
        );
        Ok((snapshot, collection))
    }
}
