//! HTTP routes for the rainfall artifact.
//!
//! - `POST /api/rainfall/sync` refreshes the artifact from the archive
//! - `GET /api/rainfall/latest` returns the last synced collection
//! - `GET /health` and `GET /metrics`

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use archive_client::ArchiveConfig;
use artifact_cache::{ArtifactError, SyncError, SyncOutcome, SyncStatus, SyncSummary, SyncTarget};
use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::state::{ConnectorFactory, ServerState};

// ============================================================================
// Request / Response Types
// ============================================================================

/// Body of `POST /api/rainfall/sync`.
///
/// Blank or missing connection fields fall back to the configured archive.
#[derive(Default, Deserialize)]
pub struct SyncRequest {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date: Option<String>,
    /// `HH`, only honoured together with `date`
    #[serde(default)]
    pub hour: Option<String>,
}

impl SyncRequest {
    fn archive_config(&self, base: &ArchiveConfig) -> ArchiveConfig {
        fn pick<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
            value
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(fallback)
        }
        base.with_credentials(
            pick(&self.host, &base.host),
            pick(&self.user, &base.user),
            // passwords are not trimmed
            self.password
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or(&base.password),
        )
    }
}

impl fmt::Debug for SyncRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncRequest")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("date", &self.date)
            .field("hour", &self.hour)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncResponse {
    pub status: SyncStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<usize>,
}

impl SyncResponse {
    fn error(message: impl Into<String>) -> Self {
        Self {
            status: SyncStatus::Error,
            message: message.into(),
            timestamp: None,
            filename: None,
            features: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

// ============================================================================
// Router
// ============================================================================

/// Build the HTTP router.
pub fn build_router<F: ConnectorFactory>(state: Arc<ServerState<F>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/rainfall/sync", post(sync_handler::<F>))
        .route("/api/rainfall/latest", get(latest_handler::<F>))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler::<F>))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(Extension(state))
}

/// Start the HTTP server.
pub async fn run_server<F: ConnectorFactory>(state: Arc<ServerState<F>>, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(port = port, "Starting rainfall HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(SyncResponse::error(message))).into_response()
}

/// HTTP status for a failed sync.
pub fn sync_error_status(err: &SyncError) -> StatusCode {
    match err {
        SyncError::Configuration(_) => StatusCode::BAD_REQUEST,
        SyncError::Archive(_) | SyncError::Parse(_) => StatusCode::BAD_GATEWAY,
        SyncError::Artifact(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// POST /api/rainfall/sync - Refresh the artifact from one snapshot
async fn sync_handler<F: ConnectorFactory>(
    Extension(state): Extension<Arc<ServerState<F>>>,
    payload: Result<Json<SyncRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let target = match SyncTarget::parse(request.date.as_deref(), request.hour.as_deref()) {
        Ok(target) => target,
        Err(e) => return error_response(sync_error_status(&e), e.to_string()),
    };

    let sync_id = Uuid::new_v4();
    let config = request.archive_config(&state.archive);
    info!(sync_id = %sync_id, host = %config.host, sync_target = %target, "Sync requested");

    let connector = state.connectors.connector(config);
    let lock = state.sync_lock.clone();
    let worker = state.clone();
    let work = async move {
        let guard = lock.lock_owned().await;
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            worker.cache.sync(&connector, target)
        })
        .await
    };

    match tokio::time::timeout(state.sync_timeout, work).await {
        Ok(Ok(result)) => {
            let outcome = SyncOutcome::from(&result);
            match result {
                Ok(summary) => Json(success_response(outcome, summary)).into_response(),
                Err(e) => error_response(sync_error_status(&e), outcome.message),
            }
        }
        Ok(Err(join_err)) => {
            error!(sync_id = %sync_id, error = %join_err, "Sync task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("sync task failed: {join_err}"))
        }
        Err(_) => {
            counter!("rainfall_sync_timeouts_total").increment(1);
            warn!(
                sync_id = %sync_id,
                timeout_secs = state.sync_timeout.as_secs(),
                "Sync timed out"
            );
            error_response(
                StatusCode::GATEWAY_TIMEOUT,
                format!("sync timed out after {}s", state.sync_timeout.as_secs()),
            )
        }
    }
}

fn success_response(outcome: SyncOutcome, summary: SyncSummary) -> SyncResponse {
    SyncResponse {
        status: outcome.status,
        message: outcome.message,
        timestamp: Some(summary.timestamp),
        filename: Some(summary.filename),
        features: Some(summary.features),
    }
}

/// GET /api/rainfall/latest - Last synced collection
async fn latest_handler<F: ConnectorFactory>(Extension(state): Extension<Arc<ServerState<F>>>) -> Response {
    match state.cache.latest() {
        Ok(collection) => Json(collection).into_response(),
        Err(e @ ArtifactError::NotSynced { .. }) => error_response(StatusCode::NOT_FOUND, e.to_string()),
        Err(e) => {
            error!(error = %e, "Failed to read rainfall artifact");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// GET /health - Health check
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "rainfall-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /metrics - Prometheus metrics
async fn metrics_handler<F: ConnectorFactory>(Extension(state): Extension<Arc<ServerState<F>>>) -> impl IntoResponse {
    state.metrics.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive_client::ArchiveError;

    #[test]
    fn test_status_mapping() {
        let missing = SyncError::Configuration("no snapshot available for latest".to_string());
        assert_eq!(sync_error_status(&missing), StatusCode::BAD_REQUEST);
        let fetch = SyncError::Archive(ArchiveError::fetch("/now/latest/x.gz", "550"));
        assert_eq!(sync_error_status(&fetch), StatusCode::BAD_GATEWAY);
        let write = SyncError::Artifact(ArtifactError::Io {
            path: "/data/rain.geojson".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        });
        assert_eq!(sync_error_status(&write), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_request_falls_back_to_configured_archive() {
        let base = ArchiveConfig {
            user: "rainmap".to_string(),
            password: "from-env".to_string(),
            ..ArchiveConfig::default()
        };
        let request: SyncRequest =
            serde_json::from_str(r#"{"host": " ", "user": "alice", "date": "2024-11-17"}"#).unwrap();
        let config = request.archive_config(&base);
        assert_eq!(config.host, "hokusai.eorc.jaxa.jp");
        assert_eq!(config.user, "alice");
        assert_eq!(config.password, "from-env");
    }

    #[test]
    fn test_request_debug_hides_password() {
        let request = SyncRequest {
            password: Some("hunter2".to_string()),
            ..SyncRequest::default()
        };
        assert!(!format!("{request:?}").contains("hunter2"));
    }
}
