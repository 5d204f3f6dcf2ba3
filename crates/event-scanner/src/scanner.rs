//! The scan state machine.
//!
//! ```text
//! Idle -> SelectingPeriod -> ListingDays -> ProbingSnapshot -> MatchFound | Exhausted -> Idle
//! ```
//!
//! Periods and days are walked in the caller's [`Traversal`] order; within a
//! day, snapshots are probed in [`SamplingStrategy`] order. The first probe
//! whose regional maximum exceeds the threshold ends the scan. Listing and
//! probe failures are logged, counted and skipped. Only failing to open the
//! session ends a scan with an error.

use std::time::Instant;

use archive_client::{
    ArchiveClient, ArchiveConfig, ArchiveConnector, ArchiveLayout, ArchiveTransport, StagingArea,
};
use gsmap_parser::decode_compressed;
use metrics::counter;
use rain_common::{BoundingBox, CellCoord, DayPath, SnapshotId, YearMonth};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{ProbeError, Result, ScanError};
use crate::sampling::SamplingStrategy;
use crate::window::{TimeWindow, Traversal};

/// Where the scanner is in its walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    SelectingPeriod,
    ListingDays,
    ProbingSnapshot,
    MatchFound,
    Exhausted,
}

/// Everything a scan needs to know.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub window: TimeWindow,
    pub traversal: Traversal,
    pub region: BoundingBox,
    /// A probe matches when its regional maximum is strictly greater.
    pub threshold: f32,
    pub sampling: SamplingStrategy,
    /// Only the first N admitted days of each period, after ordering.
    pub max_days_per_period: Option<usize>,
    /// Date-tree root overriding the scanner's layout.
    pub archive_root: Option<String>,
}

impl ScanRequest {
    pub fn new(window: TimeWindow, traversal: Traversal, region: BoundingBox, threshold: f32) -> Self {
        Self {
            window,
            traversal,
            region,
            threshold,
            sampling: SamplingStrategy::All,
            max_days_per_period: None,
            archive_root: None,
        }
    }

    pub fn with_sampling(mut self, sampling: SamplingStrategy) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_max_days(mut self, max_days: usize) -> Self {
        self.max_days_per_period = Some(max_days);
        self
    }

    pub fn with_archive_root(mut self, root: impl Into<String>) -> Self {
        self.archive_root = Some(root.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.window.validate().map_err(ScanError::Configuration)?;
        self.sampling.validate().map_err(ScanError::Configuration)?;
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(ScanError::Configuration(format!(
                "threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        if self.region.min_lat > self.region.max_lat || self.region.min_lon > self.region.max_lon {
            return Err(ScanError::Configuration(format!(
                "region {} is inverted",
                self.region
            )));
        }
        if self.max_days_per_period == Some(0) {
            return Err(ScanError::Configuration(
                "max_days_per_period must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A threshold crossing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanMatch {
    pub snapshot: SnapshotId,
    pub day: DayPath,
    pub max_intensity: f32,
    pub region: BoundingBox,
    /// Reference corner of the first cell (row-major) above the threshold
    pub first_exceeding_cell: Option<CellCoord>,
}

/// Outcome of a scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ScanResult {
    NoMatch,
    Match(ScanMatch),
}

impl ScanResult {
    pub fn is_match(&self) -> bool {
        matches!(self, ScanResult::Match(_))
    }

    pub fn as_match(&self) -> Option<&ScanMatch> {
        match self {
            ScanResult::Match(m) => Some(m),
            ScanResult::NoMatch => None,
        }
    }
}

/// Counters collected during one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub periods_visited: usize,
    pub days_listed: usize,
    pub probes_attempted: usize,
    pub probes_failed: usize,
    pub listing_failures: usize,
}

/// Result plus the counters that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    #[serde(flatten)]
    pub result: ScanResult,
    pub stats: ScanStats,
    /// Snapshots probed, in order
    pub probed: Vec<String>,
    pub duration_ms: u64,
}

/// Runs scans against any archive connector.
#[derive(Debug, Clone, Default)]
pub struct EventScanner {
    layout: ArchiveLayout,
    staging: StagingArea,
}

struct ScanState {
    phase: ScanPhase,
    stats: ScanStats,
    probed: Vec<String>,
}

impl ScanState {
    fn enter(&mut self, next: ScanPhase) {
        if self.phase != next {
            debug!(from = ?self.phase, to = ?next, "Scan phase");
            self.phase = next;
        }
    }
}

struct Reading {
    max_intensity: f32,
    first_exceeding_cell: Option<CellCoord>,
}

impl EventScanner {
    pub fn new(layout: ArchiveLayout, staging: StagingArea) -> Self {
        Self { layout, staging }
    }

    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self::new(
            config.layout.clone(),
            StagingArea::new(config.staging_dir.clone()),
        )
    }

    /// Search the archive for the first snapshot exceeding the threshold.
    ///
    /// Opens one session for the whole scan and closes it before returning.
    #[instrument(skip(self, connector, request), fields(
        endpoint = %connector.endpoint(),
        window = %request.window,
        traversal = %request.traversal,
        threshold = request.threshold,
    ))]
    pub fn scan<C: ArchiveConnector>(&self, connector: &C, request: &ScanRequest) -> Result<ScanReport> {
        let started = Instant::now();
        let mut state = ScanState {
            phase: ScanPhase::Idle,
            stats: ScanStats::default(),
            probed: Vec::new(),
        };

        request.validate()?;

        let layout = match &request.archive_root {
            Some(root) => self.layout.with_root(root.as_str()),
            None => self.layout.clone(),
        };
        let mut client =
            ArchiveClient::open(connector, layout, self.staging.clone()).map_err(ScanError::Session)?;

        let outcome = self.walk(&mut client, request, &mut state);
        client.close();
        let result = outcome?;

        match &result {
            ScanResult::Match(m) => {
                state.enter(ScanPhase::MatchFound);
                counter!("rainfall_scan_matches_total").increment(1);
                info!(
                    day = %m.day,
                    file = %m.snapshot.filename,
                    max_intensity = m.max_intensity,
                    probes = state.stats.probes_attempted,
                    "Threshold exceeded"
                );
            }
            ScanResult::NoMatch => {
                state.enter(ScanPhase::Exhausted);
                info!(
                    periods = state.stats.periods_visited,
                    probes = state.stats.probes_attempted,
                    failed = state.stats.probes_failed,
                    "No snapshot exceeded the threshold"
                );
            }
        }
        state.enter(ScanPhase::Idle);

        Ok(ScanReport {
            result,
            stats: state.stats,
            probed: state.probed,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn walk<T: ArchiveTransport>(
        &self,
        client: &mut ArchiveClient<T>,
        request: &ScanRequest,
        state: &mut ScanState,
    ) -> Result<ScanResult> {
        for period in request.window.periods(request.traversal) {
            state.enter(ScanPhase::SelectingPeriod);
            state.stats.periods_visited += 1;

            state.enter(ScanPhase::ListingDays);
            for day in self.days_of(client, period, request, state) {
                state.stats.days_listed += 1;

                let snapshots = match client.list_snapshots(&day) {
                    Ok(snapshots) => snapshots,
                    Err(e) => {
                        warn!(day = %day, error = %e, "Day listing failed, skipping");
                        state.stats.listing_failures += 1;
                        counter!("rainfall_listing_failures_total").increment(1);
                        continue;
                    }
                };

                for snapshot in request.sampling.apply(&snapshots) {
                    state.enter(ScanPhase::ProbingSnapshot);
                    state.stats.probes_attempted += 1;
                    state.probed.push(snapshot.filename.clone());
                    counter!("rainfall_probes_total").increment(1);

                    match probe(client, &day, snapshot, request) {
                        Ok(reading) if reading.max_intensity > request.threshold => {
                            return Ok(ScanResult::Match(ScanMatch {
                                snapshot: snapshot.clone(),
                                day,
                                max_intensity: reading.max_intensity,
                                region: request.region,
                                first_exceeding_cell: reading.first_exceeding_cell,
                            }));
                        }
                        Ok(reading) => {
                            debug!(
                                file = %snapshot.filename,
                                max_intensity = reading.max_intensity,
                                "Below threshold"
                            );
                        }
                        // Only session errors are fatal, and only the archive raises them.
                        Err(ProbeError::Archive(e)) if e.is_fatal() => return Err(ScanError::Session(e)),
                        Err(e) => {
                            warn!(
                                file = %snapshot.filename,
                                kind = e.kind().as_str(),
                                error = %e,
                                "Probe failed, skipping"
                            );
                            state.stats.probes_failed += 1;
                            counter!("rainfall_probe_failures_total", "kind" => e.kind().as_str())
                                .increment(1);
                        }
                    }
                }

                state.enter(ScanPhase::ListingDays);
            }
        }

        Ok(ScanResult::NoMatch)
    }

    /// Admitted days of a period in traversal order, capped per request.
    fn days_of<T: ArchiveTransport>(
        &self,
        client: &mut ArchiveClient<T>,
        period: YearMonth,
        request: &ScanRequest,
        state: &mut ScanState,
    ) -> Vec<DayPath> {
        let names = match client.try_list_days(period) {
            Ok(names) => names,
            Err(e) => {
                warn!(period = %period, error = %e, "Month listing failed, skipping period");
                state.stats.listing_failures += 1;
                counter!("rainfall_listing_failures_total").increment(1);
                return Vec::new();
            }
        };

        let days: Vec<DayPath> = names
            .iter()
            .filter_map(|name| match DayPath::from_listing(period, name) {
                Ok(day) => Some(day),
                Err(e) => {
                    debug!(period = %period, entry = %name, error = %e, "Ignoring day entry");
                    None
                }
            })
            .filter(|day| request.window.admits(day))
            .collect();

        let mut days = request.traversal.order(days);
        if let Some(limit) = request.max_days_per_period {
            days.truncate(limit);
        }
        debug!(period = %period, days = days.len(), "Days selected");
        days
    }
}

/// Fetch, decode and evaluate one snapshot. The grid is dropped on return.
fn probe<T: ArchiveTransport>(
    client: &mut ArchiveClient<T>,
    day: &DayPath,
    snapshot: &SnapshotId,
    request: &ScanRequest,
) -> std::result::Result<Reading, ProbeError> {
    let data = client.fetch_snapshot(day, snapshot)?;
    let grid = decode_compressed(&data)?;

    let window = grid.window(&request.region);
    let max_intensity = window.max();
    let first_exceeding_cell = if max_intensity > request.threshold {
        window.first_exceeding(request.threshold)
    } else {
        None
    };

    Ok(Reading {
        max_intensity,
        first_exceeding_cell,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive_client::{ConnectFailure, MemoryArchive};
    use rain_common::regions;
    use test_utils::{ymd, ArchiveFixture};

    fn november() -> TimeWindow {
        TimeWindow::Month(YearMonth::new(2024, 11).unwrap())
    }

    #[test]
    fn test_descending_stops_at_first_match() {
        let fixture = ArchiveFixture::new();
        fixture.add_rain(ymd(2024, 11, 10), 12, 0, 0.1);
        fixture.add_rain(ymd(2024, 11, 11), 12, 0, 0.9);
        fixture.add_rain(ymd(2024, 11, 12), 12, 0, 0.2);

        let request = ScanRequest::new(november(), Traversal::Descending, regions::QUEZON_CITY, 0.5);
        let report = EventScanner::default().scan(fixture.archive(), &request).unwrap();

        let m = report.result.as_match().unwrap();
        assert_eq!(m.day.day_name(), "11");
        assert!((m.max_intensity - 0.9).abs() < 1e-6);
        assert!(m.first_exceeding_cell.is_some());
        assert_eq!(report.stats.probes_attempted, 2);

        let fetched = fixture.archive().fetch_log();
        assert_eq!(fetched.len(), 2);
        assert!(fetched[0].contains("/2024/11/12/"));
        assert!(fetched[1].contains("/2024/11/11/"));
    }

    #[test]
    fn test_ascending_finds_onset() {
        let fixture = ArchiveFixture::new();
        fixture.add_rain(ymd(2024, 11, 10), 0, 0, 0.1);
        fixture.add_rain(ymd(2024, 11, 11), 0, 0, 0.9);
        fixture.add_rain(ymd(2024, 11, 12), 0, 0, 2.0);

        let request = ScanRequest::new(november(), Traversal::Ascending, regions::QUEZON_CITY, 0.5);
        let report = EventScanner::default().scan(fixture.archive(), &request).unwrap();
        assert_eq!(report.result.as_match().unwrap().day.day_name(), "11");
    }

    #[test]
    fn test_no_match_exhausts() {
        let fixture = ArchiveFixture::new();
        fixture.add_day(ymd(2024, 11, 3), 4, 0.2);

        let request = ScanRequest::new(november(), Traversal::Descending, regions::QUEZON_CITY, 0.5);
        let report = EventScanner::default().scan(fixture.archive(), &request).unwrap();
        assert_eq!(report.result, ScanResult::NoMatch);
        assert_eq!(report.stats.periods_visited, 1);
        assert_eq!(report.stats.days_listed, 1);
        assert_eq!(report.stats.probes_attempted, 4);
    }

    #[test]
    fn test_sampling_order_within_day() {
        let fixture = ArchiveFixture::new();
        fixture.add_day(ymd(2024, 11, 5), 6, 0.0);

        let request = ScanRequest::new(november(), Traversal::Ascending, regions::QUEZON_CITY, 0.5)
            .with_sampling("fixed:last,first".parse().unwrap());
        let report = EventScanner::default().scan(fixture.archive(), &request).unwrap();
        assert_eq!(
            report.probed,
            vec![
                "gsmap_gauge_now.20241105.0230.dat.gz",
                "gsmap_gauge_now.20241105.0000.dat.gz"
            ]
        );
    }

    #[test]
    fn test_max_days_per_period_applies_after_ordering() {
        let fixture = ArchiveFixture::new();
        for d in 1..=5 {
            fixture.add_rain(ymd(2024, 11, d), 0, 0, 0.0);
        }
        let request = ScanRequest::new(november(), Traversal::Descending, regions::QUEZON_CITY, 0.5)
            .with_max_days(2);
        let report = EventScanner::default().scan(fixture.archive(), &request).unwrap();
        assert_eq!(report.stats.days_listed, 2);
        assert!(report.probed[0].contains(".20241105."));
        assert!(report.probed[1].contains(".20241104."));
    }

    #[test]
    fn test_session_failure_is_fatal() {
        let archive = MemoryArchive::new();
        archive.fail_connect(ConnectFailure::BadCredentials);
        let request = ScanRequest::new(november(), Traversal::Descending, regions::QUEZON_CITY, 0.5);
        let err = EventScanner::default().scan(&archive, &request).unwrap_err();
        assert!(matches!(err, ScanError::Session(_)));
        assert!(archive.fetch_log().is_empty());
    }

    #[test]
    fn test_invalid_request_rejected_before_connecting() {
        let archive = MemoryArchive::new();
        let request = ScanRequest::new(november(), Traversal::Descending, regions::QUEZON_CITY, f32::NAN);
        let err = EventScanner::default().scan(&archive, &request).unwrap_err();
        assert!(matches!(err, ScanError::Configuration(_)));
        assert_eq!(archive.sessions(), (0, 0));
    }

    #[test]
    fn test_session_closed_after_scan() {
        let fixture = ArchiveFixture::new();
        fixture.add_rain(ymd(2024, 11, 1), 0, 0, 3.0);
        let request = ScanRequest::new(november(), Traversal::Descending, regions::QUEZON_CITY, 0.5);
        EventScanner::default().scan(fixture.archive(), &request).unwrap();
        assert_eq!(fixture.archive().sessions(), (1, 1));
    }
}
