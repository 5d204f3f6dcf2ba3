//! Syncs against an in-memory archive.

use archive_client::{ArchiveLayout, ConnectFailure};
use artifact_cache::{
    ArtifactCache, ArtifactError, SyncConfig, SyncError, SyncOutcome, SyncStatus, SyncTarget,
};
use rain_common::{regions, ErrorKind};
use tempfile::TempDir;
use test_utils::{cell_at, dir_entries, temp_staging, ymd, ArchiveFixture};

struct Harness {
    fixture: ArchiveFixture,
    cache: ArtifactCache,
    _artifact_dir: TempDir,
    staging_dir: TempDir,
}

fn harness() -> Harness {
    let artifact_dir = tempfile::tempdir().unwrap();
    let (staging_dir, staging) = temp_staging();
    let config = SyncConfig {
        artifact_path: artifact_dir.path().join("rainfall_qc.geojson"),
        ..SyncConfig::default()
    };
    Harness {
        fixture: ArchiveFixture::new(),
        cache: ArtifactCache::new(config, ArchiveLayout::default(), staging),
        _artifact_dir: artifact_dir,
        staging_dir,
    }
}

fn qc_cell(intensity: f32) -> Vec<(usize, usize, f32)> {
    let (row, col) = cell_at(14.75, 121.15);
    vec![(row, col, intensity)]
}

#[test]
fn test_latest_sync_writes_full_window() {
    let h = harness();
    h.fixture.add_latest(ymd(2026, 2, 10), 11, 30, &qc_cell(0.4));
    h.fixture.add_latest(ymd(2026, 2, 10), 12, 0, &qc_cell(2.0));

    let summary = h.cache.sync(h.fixture.archive(), SyncTarget::Latest).unwrap();
    assert_eq!(summary.filename, "gsmap_gauge_now.20260210.1200.dat.gz");
    assert_eq!(summary.timestamp, "2026-02-10 12:00 UTC");

    let collection = h.cache.latest().unwrap();
    assert_eq!(collection.features.len(), 100);
    assert_eq!(collection.max_intensity(), 2.0);
    assert!(collection
        .features
        .iter()
        .all(|f| f.ring().len() == 5 && f.ring()[0] == f.ring()[4]));
    assert_eq!(dir_entries(h.staging_dir.path()), 0);
}

#[test]
fn test_second_sync_replaces_first() {
    let h = harness();
    h.fixture.add_snapshot(ymd(2024, 11, 17), 6, 0, &qc_cell(1.0));
    h.fixture.add_snapshot(ymd(2024, 11, 18), 6, 0, &qc_cell(3.0));

    h.cache
        .sync(h.fixture.archive(), SyncTarget::Day(ymd(2024, 11, 17)))
        .unwrap();
    h.cache
        .sync(h.fixture.archive(), SyncTarget::Day(ymd(2024, 11, 18)))
        .unwrap();

    let collection = h.cache.latest().unwrap();
    assert_eq!(collection.filename, "gsmap_gauge_now.20241118.0600.dat.gz");
    assert_eq!(collection.features.len(), 100);
    assert_eq!(collection.max_intensity(), 3.0);
}

#[test]
fn test_day_sync_picks_last_snapshot() {
    let h = harness();
    h.fixture.add_day(ymd(2024, 11, 17), 48, 0.5);

    let summary = h
        .cache
        .sync(h.fixture.archive(), SyncTarget::Day(ymd(2024, 11, 17)))
        .unwrap();
    assert_eq!(summary.filename, "gsmap_gauge_now.20241117.2330.dat.gz");
}

#[test]
fn test_hour_filter_picks_last_of_that_hour() {
    let h = harness();
    h.fixture.add_day(ymd(2024, 11, 17), 48, 0.5);

    let target = SyncTarget::parse(Some("2024-11-17"), Some("06")).unwrap();
    let summary = h.cache.sync(h.fixture.archive(), target).unwrap();
    assert_eq!(summary.filename, "gsmap_gauge_now.20241117.0630.dat.gz");
}

#[test]
fn test_missing_hour_leaves_artifact_untouched() {
    let h = harness();
    h.fixture.add_snapshot(ymd(2024, 11, 17), 5, 0, &qc_cell(1.0));
    h.cache
        .sync(h.fixture.archive(), SyncTarget::Day(ymd(2024, 11, 17)))
        .unwrap();
    let before = std::fs::read(h.cache.store().path()).unwrap();

    let err = h
        .cache
        .sync(h.fixture.archive(), SyncTarget::DayHour(ymd(2024, 11, 17), 6))
        .unwrap_err();
    assert!(matches!(err, SyncError::Configuration(_)));
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let after = std::fs::read(h.cache.store().path()).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_not_synced_before_first_sync() {
    let h = harness();
    assert!(matches!(h.cache.latest(), Err(ArtifactError::NotSynced { .. })));
}

#[test]
fn test_fetch_failure_reports_error_and_cleans_staging() {
    let h = harness();
    let path = h.fixture.add_latest(ymd(2026, 2, 10), 12, 0, &qc_cell(2.0));
    h.fixture.archive().fail_fetch(&path);

    let result = h.cache.sync(h.fixture.archive(), SyncTarget::Latest);
    let outcome = SyncOutcome::from(&result);
    assert_eq!(outcome.status, SyncStatus::Error);
    assert!(matches!(result, Err(SyncError::Archive(_))));
    assert_eq!(dir_entries(h.staging_dir.path()), 0);
    assert!(!h.cache.store().exists());
}

#[test]
fn test_auth_failure() {
    let h = harness();
    h.fixture.archive().fail_connect(ConnectFailure::BadCredentials);
    let err = h
        .cache
        .sync(h.fixture.archive(), SyncTarget::Latest)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
}

#[test]
fn test_custom_reference_window() {
    let artifact_dir = tempfile::tempdir().unwrap();
    let config = SyncConfig {
        reference_window: regions::QUEZON_CITY,
        provenance: "test-run".to_string(),
        artifact_path: artifact_dir.path().join("qc.geojson"),
    };
    let fixture = ArchiveFixture::new();
    fixture.add_latest(ymd(2026, 2, 10), 12, 0, &qc_cell(1.0));

    let cache = ArtifactCache::new(config, ArchiveLayout::default(), Default::default());
    let summary = cache.sync(fixture.archive(), SyncTarget::Latest).unwrap();
    assert_eq!(summary.features, 4);
    let collection = cache.latest().unwrap();
    assert!(collection
        .features
        .iter()
        .all(|f| f.properties.source == "test-run"));
}
