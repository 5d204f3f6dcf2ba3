//! Layout-aware archive client.

use bytes::Bytes;
use rain_common::{DayPath, SnapshotId, YearMonth};
use tracing::{debug, instrument, warn};

use crate::config::ArchiveLayout;
use crate::error::{ArchiveError, Result};
use crate::staging::StagingArea;
use crate::transport::{ArchiveConnector, ArchiveTransport};

/// Archive client bound to one open session.
pub struct ArchiveClient<T: ArchiveTransport> {
    transport: T,
    layout: ArchiveLayout,
    staging: StagingArea,
}

impl<T: ArchiveTransport> ArchiveClient<T> {
    pub fn new(transport: T, layout: ArchiveLayout, staging: StagingArea) -> Self {
        Self {
            transport,
            layout,
            staging,
        }
    }

    /// Connect through `connector` and wrap the session.
    pub fn open<C>(connector: &C, layout: ArchiveLayout, staging: StagingArea) -> Result<Self>
    where
        C: ArchiveConnector<Transport = T>,
    {
        let transport = connector.connect()?;
        Ok(Self::new(transport, layout, staging))
    }

    pub fn layout(&self) -> &ArchiveLayout {
        &self.layout
    }

    /// Day directories present for a month, sorted ascending.
    ///
    /// A missing or unreadable month yields an empty list; the failure is
    /// logged, never returned.
    #[instrument(skip(self), fields(root = %self.layout.root))]
    pub fn list_days(&mut self, period: YearMonth) -> Vec<String> {
        self.try_list_days(period).unwrap_or_else(|e| {
            warn!(period = %period, error = %e, "Month listing failed, treating as empty");
            Vec::new()
        })
    }

    /// Like [`list_days`](Self::list_days) but reports the listing failure.
    pub fn try_list_days(&mut self, period: YearMonth) -> Result<Vec<String>> {
        let path = period.path(&self.layout.root);
        let entries = self.transport.list(&path)?;
        let mut days: Vec<String> = entries
            .iter()
            .map(|e| basename(e))
            .filter(|name| is_day_name(name))
            .map(str::to_string)
            .collect();
        days.sort();
        days.dedup();
        debug!(path = %path, days = days.len(), "Listed month");
        Ok(days)
    }

    /// Snapshots in one day directory, sorted by filename.
    #[instrument(skip(self), fields(root = %self.layout.root))]
    pub fn list_snapshots(&mut self, day: &DayPath) -> Result<Vec<SnapshotId>> {
        let path = day.path(&self.layout.root);
        self.list_snapshots_in(&path)
    }

    /// Snapshots in the rolling latest directory, sorted by filename.
    pub fn list_latest(&mut self) -> Result<Vec<SnapshotId>> {
        let path = self.layout.latest_dir.clone();
        self.list_snapshots_in(&path)
    }

    fn list_snapshots_in(&mut self, path: &str) -> Result<Vec<SnapshotId>> {
        let entries = self.transport.list(path)?;
        let mut snapshots: Vec<SnapshotId> = entries
            .iter()
            .map(|e| basename(e))
            .filter(|name| self.layout.is_snapshot_name(name))
            .filter_map(|name| match SnapshotId::parse(name) {
                Ok(id) => Some(id),
                Err(e) => {
                    debug!(name = %name, error = %e, "Skipping unparsable entry");
                    None
                }
            })
            .collect();
        snapshots.sort();
        snapshots.dedup();
        debug!(path = %path, snapshots = snapshots.len(), "Listed snapshots");
        Ok(snapshots)
    }

    /// Download one file into memory.
    ///
    /// The transfer goes through a staging file which is gone by the time
    /// this returns, on success and on failure alike.
    #[instrument(skip(self))]
    pub fn fetch(&mut self, dir: &str, filename: &str) -> Result<Bytes> {
        let path = format!("{}/{}", dir.trim_end_matches('/'), filename);

        let mut staged = self
            .staging
            .stage()
            .map_err(|e| ArchiveError::fetch(&path, format!("staging: {e}")))?;

        let written = self.transport.retrieve(&path, staged.writer())?;

        let data = staged
            .into_bytes()
            .map_err(|e| ArchiveError::fetch(&path, format!("staging: {e}")))?;

        debug!(path = %path, size = written, "Fetched file");
        Ok(data)
    }

    /// Download a snapshot from its day directory.
    pub fn fetch_snapshot(&mut self, day: &DayPath, snapshot: &SnapshotId) -> Result<Bytes> {
        let dir = day.path(&self.layout.root);
        self.fetch(&dir, &snapshot.filename)
    }

    /// Download a snapshot from the latest directory.
    pub fn fetch_latest(&mut self, snapshot: &SnapshotId) -> Result<Bytes> {
        let dir = self.layout.latest_dir.clone();
        self.fetch(&dir, &snapshot.filename)
    }

    /// End the session. A failing close is logged and otherwise ignored.
    pub fn close(mut self) {
        if let Err(e) = self.transport.close() {
            warn!(error = %e, "Archive session did not close cleanly");
        }
    }
}

fn basename(entry: &str) -> &str {
    entry.trim_end_matches('/').rsplit('/').next().unwrap_or(entry)
}

fn is_day_name(name: &str) -> bool {
    name.len() == 2 && name.bytes().all(|b| b.is_ascii_digit())
}
