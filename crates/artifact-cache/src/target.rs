//! Which snapshot a sync extracts.

use archive_client::{ArchiveClient, ArchiveTransport};
use chrono::NaiveDate;
use rain_common::{DayPath, SnapshotId};
use tracing::{debug, warn};

use crate::error::{Result, SyncError};

/// Sync target as requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTarget {
    /// Newest snapshot in the rolling latest directory.
    Latest,
    /// Last snapshot of a day.
    Day(NaiveDate),
    /// Last snapshot of a day whose encoded hour matches.
    DayHour(NaiveDate, u32),
}

impl SyncTarget {
    /// Parse optional `YYYY-MM-DD` and `HH` strings.
    ///
    /// Blank strings count as absent. An hour without a date is ignored.
    pub fn parse(date: Option<&str>, hour: Option<&str>) -> Result<Self> {
        let date = date.map(str::trim).filter(|s| !s.is_empty());
        let hour = hour.map(str::trim).filter(|s| !s.is_empty());

        let Some(date) = date else {
            if let Some(hour) = hour {
                warn!(hour = %hour, "Hour given without a date, syncing latest");
            }
            return Ok(SyncTarget::Latest);
        };

        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| SyncError::Configuration(format!("invalid date '{date}', expected YYYY-MM-DD")))?;

        match hour {
            None => Ok(SyncTarget::Day(date)),
            Some(h) => {
                let parsed: u32 = h
                    .parse()
                    .ok()
                    .filter(|v| *v < 24 && h.len() <= 2)
                    .ok_or_else(|| SyncError::Configuration(format!("invalid hour '{h}', expected 00-23")))?;
                Ok(SyncTarget::DayHour(date, parsed))
            }
        }
    }

    /// Resolve to a directory and snapshot on the archive.
    pub fn resolve<T: ArchiveTransport>(&self, client: &mut ArchiveClient<T>) -> Result<(String, SnapshotId)> {
        let (dir, candidates) = match *self {
            SyncTarget::Latest => (client.layout().latest_dir.clone(), client.list_latest()?),
            SyncTarget::Day(date) | SyncTarget::DayHour(date, _) => {
                let day = DayPath::new(date);
                let dir = day.path(&client.layout().root);
                (dir, client.list_snapshots(&day)?)
            }
        };
        debug!(sync_target = %self, candidates = candidates.len(), "Resolving sync target");

        let chosen = match *self {
            SyncTarget::DayHour(_, hour) => candidates.into_iter().rev().find(|s| s.hour() == hour),
            _ => candidates.into_iter().last(),
        };

        chosen
            .map(|snapshot| (dir, snapshot))
            .ok_or_else(|| SyncError::Configuration(format!("no snapshot available for {self}")))
    }
}

impl std::fmt::Display for SyncTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncTarget::Latest => write!(f, "latest"),
            SyncTarget::Day(date) => write!(f, "{date}"),
            SyncTarget::DayHour(date, hour) => write!(f, "{date} {hour:02}:00"),
        }
    }
}
