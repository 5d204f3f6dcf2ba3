//! Time handling for archive snapshots and their date-partitioned directories.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Identifies one snapshot by its archive filename.
///
/// Filenames follow `<product>.YYYYMMDD.HHMM[.<ext>...]`, for example
/// `gsmap_gauge_now.20241117.0630.dat.gz`. Ordering is lexicographic on the
/// filename, which for a single product is chronological.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId {
    /// Base filename as listed by the archive
    pub filename: String,
    /// Observation time encoded in the filename
    pub timestamp: DateTime<Utc>,
}

impl SnapshotId {
    /// Parse a snapshot identifier from a filename or a path ending in one.
    pub fn parse(name: &str) -> Result<Self, TimeParseError> {
        let filename = name.rsplit('/').next().unwrap_or(name);
        let mut parts = filename.split('.');
        let (_product, date_part, time_part) = match (parts.next(), parts.next(), parts.next()) {
            (Some(p), Some(d), Some(t)) => (p, d, t),
            _ => return Err(TimeParseError::InvalidFilename(filename.to_string())),
        };

        if date_part.len() != 8 || time_part.len() != 4 {
            return Err(TimeParseError::InvalidFilename(filename.to_string()));
        }

        let date = NaiveDate::parse_from_str(date_part, "%Y%m%d")
            .map_err(|_| TimeParseError::InvalidFilename(filename.to_string()))?;
        let time = NaiveTime::parse_from_str(time_part, "%H%M")
            .map_err(|_| TimeParseError::InvalidFilename(filename.to_string()))?;

        Ok(Self {
            filename: filename.to_string(),
            timestamp: Utc.from_utc_datetime(&date.and_time(time)),
        })
    }

    /// Observation date.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Hour of day encoded in the filename.
    pub fn hour(&self) -> u32 {
        chrono::Timelike::hour(&self.timestamp)
    }

    /// Human-readable timestamp, e.g. `2024-11-17 06:30 UTC`.
    pub fn display_timestamp(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M UTC").to_string()
    }
}

impl PartialOrd for SnapshotId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SnapshotId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.filename.cmp(&other.filename)
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.filename)
    }
}

/// A calendar month, the archive's top-level partition below the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Create a year-month, validating the month.
    pub fn new(year: i32, month: u32) -> Result<Self, TimeParseError> {
        if !(1..=12).contains(&month) {
            return Err(TimeParseError::InvalidMonth(format!("{year}-{month}")));
        }
        Ok(Self { year, month })
    }

    /// The month containing a date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parse `YYYY-MM`.
    pub fn parse(s: &str) -> Result<Self, TimeParseError> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| TimeParseError::InvalidMonth(s.to_string()))?;
        let year = year
            .parse()
            .map_err(|_| TimeParseError::InvalidMonth(s.to_string()))?;
        let month = month
            .parse()
            .map_err(|_| TimeParseError::InvalidMonth(s.to_string()))?;
        Self::new(year, month)
    }

    /// The month before this one, rolling over the year.
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// The month after this one, rolling over the year.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Check if a date falls in this month.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Absolute directory path of this month below `root`.
    pub fn path(&self, root: &str) -> String {
        format!("{}/{:04}/{:02}/", root.trim_end_matches('/'), self.year, self.month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// One day directory in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DayPath {
    pub date: NaiveDate,
}

impl DayPath {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    /// Build from a month and a listed day directory name such as `"07"`.
    pub fn from_listing(period: YearMonth, day: &str) -> Result<Self, TimeParseError> {
        let day_num: u32 = day
            .parse()
            .map_err(|_| TimeParseError::InvalidDay(day.to_string()))?;
        NaiveDate::from_ymd_opt(period.year, period.month, day_num)
            .map(Self::new)
            .ok_or_else(|| TimeParseError::InvalidDay(format!("{period}-{day}")))
    }

    pub fn year_month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }

    /// Two-digit day directory name.
    pub fn day_name(&self) -> String {
        format!("{:02}", self.date.day())
    }

    /// Absolute directory path of this day below `root`.
    pub fn path(&self, root: &str) -> String {
        format!(
            "{}{:02}/",
            self.year_month().path(root),
            self.date.day()
        )
    }
}

impl fmt::Display for DayPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format("%Y-%m-%d"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid snapshot filename: {0}")]
    InvalidFilename(String),

    #[error("Invalid month: {0}")]
    InvalidMonth(String),

    #[error("Invalid day: {0}")]
    InvalidDay(String),
}
