//! Shared service state.

use std::sync::Arc;
use std::time::Duration;

use archive_client::{ArchiveConfig, ArchiveConnector, FtpConnector};
use artifact_cache::ArtifactCache;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::Mutex;

/// Builds a connector for one sync from the caller's credentials.
pub trait ConnectorFactory: Send + Sync + 'static {
    type Connector: ArchiveConnector + Send + 'static;

    fn connector(&self, config: ArchiveConfig) -> Self::Connector;
}

/// Connects to the real archive over FTP.
#[derive(Debug, Clone, Copy, Default)]
pub struct FtpConnectorFactory;

impl ConnectorFactory for FtpConnectorFactory {
    type Connector = FtpConnector;

    fn connector(&self, config: ArchiveConfig) -> FtpConnector {
        FtpConnector::new(config)
    }
}

pub struct ServerState<F> {
    /// Port, timeouts and layout; host and credentials come per request
    pub archive: ArchiveConfig,
    pub cache: ArtifactCache,
    pub connectors: F,
    /// Held for the whole blocking sync, including past a timeout
    pub sync_lock: Arc<Mutex<()>>,
    pub sync_timeout: Duration,
    pub metrics: PrometheusHandle,
}

impl<F: ConnectorFactory> ServerState<F> {
    pub fn new(
        archive: ArchiveConfig,
        cache: ArtifactCache,
        connectors: F,
        sync_timeout: Duration,
        metrics: PrometheusHandle,
    ) -> Self {
        Self {
            archive,
            cache,
            connectors,
            sync_lock: Arc::new(Mutex::new(())),
            sync_timeout,
            metrics,
        }
    }
}
