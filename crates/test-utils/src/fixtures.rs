//! In-memory archive fixtures.
//!
//! [`ArchiveFixture`] fills a [`MemoryArchive`] using the same
//! `{root}/{YYYY}/{MM}/{DD}/` layout and filenames as the real archive.

use archive_client::{ArchiveLayout, MemoryArchive, StagingArea};
use chrono::NaiveDate;
use tempfile::TempDir;

use crate::generators::{quezon_city_rain, Cell, snapshot_payload};

/// Archive filename for a half-hour snapshot.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use test_utils::snapshot_name;
///
/// let date = NaiveDate::from_ymd_opt(2024, 11, 17).unwrap();
/// assert_eq!(snapshot_name(date, 6, 30), "gsmap_gauge_now.20241117.0630.dat.gz");
/// ```
pub fn snapshot_name(date: NaiveDate, hour: u32, minute: u32) -> String {
    format!(
        "gsmap_gauge_now.{}.{:02}{:02}.dat.gz",
        date.format("%Y%m%d"),
        hour,
        minute
    )
}

/// Shorthand for a calendar date in tests.
pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// Builder over a [`MemoryArchive`] with the default layout.
#[derive(Debug, Clone)]
pub struct ArchiveFixture {
    archive: MemoryArchive,
    layout: ArchiveLayout,
}

impl Default for ArchiveFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveFixture {
    pub fn new() -> Self {
        Self {
            archive: MemoryArchive::new(),
            layout: ArchiveLayout::default(),
        }
    }

    /// Use a different date-tree root.
    pub fn with_root(mut self, root: &str) -> Self {
        self.layout = self.layout.with_root(root);
        self
    }

    pub fn archive(&self) -> &MemoryArchive {
        &self.archive
    }

    pub fn layout(&self) -> &ArchiveLayout {
        &self.layout
    }

    /// Absolute day directory path.
    pub fn day_dir(&self, date: NaiveDate) -> String {
        format!(
            "{}/{}/",
            self.layout.root.trim_end_matches('/'),
            date.format("%Y/%m/%d")
        )
    }

    /// Absolute month directory path.
    pub fn month_dir(&self, year: i32, month: u32) -> String {
        format!("{}/{:04}/{:02}/", self.layout.root.trim_end_matches('/'), year, month)
    }

    /// Absolute path of a snapshot inside its day directory.
    pub fn snapshot_path(&self, date: NaiveDate, hour: u32, minute: u32) -> String {
        format!("{}{}", self.day_dir(date), snapshot_name(date, hour, minute))
    }

    /// Add a snapshot with arbitrary cells.
    pub fn add_snapshot(&self, date: NaiveDate, hour: u32, minute: u32, cells: &[Cell]) -> String {
        let path = self.snapshot_path(date, hour, minute);
        self.archive.insert(&path, snapshot_payload(cells));
        path
    }

    /// Add a snapshot raining at `intensity` over Quezon City.
    pub fn add_rain(&self, date: NaiveDate, hour: u32, minute: u32, intensity: f32) -> String {
        let path = self.snapshot_path(date, hour, minute);
        self.archive.insert(&path, quezon_city_rain(intensity));
        path
    }

    /// Add raw bytes under a snapshot name (for corrupt-payload tests).
    pub fn add_raw(&self, date: NaiveDate, hour: u32, minute: u32, data: Vec<u8>) -> String {
        let path = self.snapshot_path(date, hour, minute);
        self.archive.insert(&path, data);
        path
    }

    /// Fill a whole day with `count` half-hourly snapshots, all at `intensity`.
    pub fn add_day(&self, date: NaiveDate, count: usize, intensity: f32) -> Vec<String> {
        (0..count.min(48))
            .map(|i| {
                let i = i as u32;
                self.add_rain(date, i / 2, (i % 2) * 30, intensity)
            })
            .collect()
    }

    /// Add a snapshot to the latest directory.
    pub fn add_latest(&self, date: NaiveDate, hour: u32, minute: u32, cells: &[Cell]) -> String {
        let path = format!(
            "{}/{}",
            self.layout.latest_dir.trim_end_matches('/'),
            snapshot_name(date, hour, minute)
        );
        self.archive.insert(&path, snapshot_payload(cells));
        path
    }
}

/// A staging area inside a fresh temp dir. Keep the [`TempDir`] alive for
/// as long as the area is used.
pub fn temp_staging() -> (TempDir, StagingArea) {
    let dir = tempfile::tempdir().expect("create staging dir");
    let area = StagingArea::new(Some(dir.path().to_path_buf()));
    (dir, area)
}

/// Number of entries left in a directory.
pub fn dir_entries(path: &std::path::Path) -> usize {
    std::fs::read_dir(path).map(|d| d.count()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_follow_archive_layout() {
        let fixture = ArchiveFixture::new();
        assert_eq!(
            fixture.snapshot_path(ymd(2024, 11, 7), 0, 30),
            "/now/half_hour_G/2024/11/07/gsmap_gauge_now.20241107.0030.dat.gz"
        );
        assert_eq!(fixture.month_dir(2024, 11), "/now/half_hour_G/2024/11/");
    }

    #[test]
    fn test_add_day_spans_half_hours() {
        let fixture = ArchiveFixture::new();
        let paths = fixture.add_day(ymd(2024, 11, 7), 3, 1.0);
        assert!(paths[0].ends_with(".0000.dat.gz"));
        assert!(paths[1].ends_with(".0030.dat.gz"));
        assert!(paths[2].ends_with(".0100.dat.gz"));
    }
}
