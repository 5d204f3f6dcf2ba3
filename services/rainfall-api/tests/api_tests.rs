//! Router tests against an in-memory archive.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use archive_client::{
    ArchiveConfig, ArchiveConnector, ArchiveLayout, ConnectFailure, MemoryArchive, MemoryTransport,
};
use artifact_cache::{ArtifactCache, SyncConfig};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use rainfall_api::{build_router, ConnectorFactory, ServerState};
use serde_json::Value;
use tempfile::TempDir;
use test_utils::{cell_at, temp_staging, ymd, ArchiveFixture};
use tower::ServiceExt;

/// Memory archive that can stall before connecting.
struct TestConnector {
    archive: MemoryArchive,
    delay: Duration,
}

impl ArchiveConnector for TestConnector {
    type Transport = MemoryTransport;

    fn connect(&self) -> archive_client::Result<MemoryTransport> {
        std::thread::sleep(self.delay);
        self.archive.connect()
    }

    fn endpoint(&self) -> String {
        "test".to_string()
    }
}

#[derive(Clone, Default)]
struct TestFactory {
    archive: MemoryArchive,
    delay: Duration,
    seen: Arc<Mutex<Vec<ArchiveConfig>>>,
}

impl ConnectorFactory for TestFactory {
    type Connector = TestConnector;

    fn connector(&self, config: ArchiveConfig) -> TestConnector {
        self.seen.lock().unwrap().push(config);
        TestConnector {
            archive: self.archive.clone(),
            delay: self.delay,
        }
    }
}

struct TestApp {
    router: Router,
    fixture: ArchiveFixture,
    factory: TestFactory,
    _dirs: (TempDir, TempDir),
}

fn app_with(delay: Duration, timeout: Duration) -> TestApp {
    let fixture = ArchiveFixture::new();
    let factory = TestFactory {
        archive: fixture.archive().clone(),
        delay,
        ..TestFactory::default()
    };

    let artifact_dir = tempfile::tempdir().unwrap();
    let (staging_dir, staging) = temp_staging();
    let sync = SyncConfig {
        artifact_path: artifact_dir.path().join("rainfall_qc.geojson"),
        ..SyncConfig::default()
    };
    let base = ArchiveConfig {
        user: "rainmap".to_string(),
        password: "configured".to_string(),
        ..ArchiveConfig::default()
    };
    let cache = ArtifactCache::new(sync, ArchiveLayout::default(), staging);
    let metrics = PrometheusBuilder::new().build_recorder().handle();
    let state = Arc::new(ServerState::new(base, cache, factory.clone(), timeout, metrics));

    TestApp {
        router: build_router(state),
        fixture,
        factory,
        _dirs: (artifact_dir, staging_dir),
    }
}

fn app() -> TestApp {
    app_with(Duration::ZERO, Duration::from_secs(30))
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn sync_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/rainfall/sync")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn add_qc_rain(fixture: &ArchiveFixture, hour: u32, intensity: f32) {
    let (row, col) = cell_at(14.75, 121.15);
    fixture.add_latest(ymd(2026, 2, 10), hour, 0, &[(row, col, intensity)]);
}

#[tokio::test]
async fn test_latest_before_sync_is_404() {
    let app = app();
    let (status, body) = send(&app.router, get("/api/rainfall/latest")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "rainfall data not yet synced");
}

#[tokio::test]
async fn test_sync_then_latest() {
    let app = app();
    add_qc_rain(&app.fixture, 11, 0.5);
    add_qc_rain(&app.fixture, 12, 2.5);

    let (status, body) = send(
        &app.router,
        sync_request(r#"{"host": "ftp.example.org", "user": "alice", "password": "secret"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["timestamp"], "2026-02-10 12:00 UTC");
    assert_eq!(body["filename"], "gsmap_gauge_now.20260210.1200.dat.gz");
    assert_eq!(body["features"], 100);

    let (status, collection) = send(&app.router, get("/api/rainfall/latest")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(collection["type"], "FeatureCollection");
    assert_eq!(collection["features"].as_array().unwrap().len(), 100);
    assert_eq!(collection["filename"], "gsmap_gauge_now.20260210.1200.dat.gz");
}

#[tokio::test]
async fn test_request_credentials_reach_connector() {
    let app = app();
    add_qc_rain(&app.fixture, 12, 1.0);

    send(
        &app.router,
        sync_request(r#"{"host": "ftp.example.org", "user": "alice", "password": "secret"}"#),
    )
    .await;

    let seen = app.factory.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].host, "ftp.example.org");
    assert_eq!(seen[0].user, "alice");
    assert_eq!(seen[0].password, "secret");
    assert_eq!(seen[0].port, 21);
}

#[tokio::test]
async fn test_missing_hour_is_400() {
    let app = app();
    app.fixture.add_rain(ymd(2024, 11, 17), 5, 0, 1.0);

    let (status, body) = send(
        &app.router,
        sync_request(r#"{"date": "2024-11-17", "hour": "06"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("no snapshot"));
}

#[tokio::test]
async fn test_invalid_date_is_rejected_before_connecting() {
    let app = app();
    let (status, body) = send(&app.router, sync_request(r#"{"date": "17/11/2024"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(app.factory.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_400_json() {
    let app = app();
    let (status, body) = send(&app.router, sync_request("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_bad_credentials_is_502() {
    let app = app();
    app.fixture.archive().fail_connect(ConnectFailure::BadCredentials);

    let (status, body) = send(&app.router, sync_request("{}")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], "error");

    let (status, _) = send(&app.router, get("/api/rainfall/latest")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_slow_sync_times_out() {
    let app = app_with(Duration::from_millis(500), Duration::from_millis(50));
    add_qc_rain(&app.fixture, 12, 1.0);

    let (status, body) = send(&app.router, sync_request("{}")).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "rainfall-api");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = app();
    let response = app.router.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
