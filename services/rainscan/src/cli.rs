//! Command-line arguments.

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use event_scanner::{SamplingStrategy, TimeWindow, Traversal};
use rain_common::YearMonth;

#[derive(Parser, Debug)]
#[command(name = "rainscan")]
#[command(about = "Scan the GSMaP rainfall archive for regional threshold events")]
pub struct Cli {
    /// Archive and sync configuration file
    #[arg(long, env = "RAINWATCH_CONFIG", default_value = "config/archive.yaml")]
    pub config: PathBuf,

    /// Directory of scan profiles
    #[arg(long, env = "RAINSCAN_PROFILES", default_value = "config/scans")]
    pub profiles_dir: PathBuf,

    /// Archive host, overriding the config file
    #[arg(long, env = "ARCHIVE_HOST")]
    pub host: Option<String>,

    /// Archive user, overriding the config file
    #[arg(long, env = "ARCHIVE_USER")]
    pub user: Option<String>,

    /// Archive password, overriding the config file
    #[arg(long, env = "ARCHIVE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Log level
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find the first snapshot whose regional maximum exceeds a threshold
    Scan(ScanArgs),

    /// Refresh the rainfall artifact from one snapshot
    Sync {
        /// Day to sync (YYYY-MM-DD); latest snapshot when omitted
        #[arg(long)]
        date: Option<String>,

        /// Hour of day (HH), only used with --date
        #[arg(long)]
        hour: Option<String>,
    },

    /// List the available scan profiles
    Profiles,

    /// List the day directories of a month (YYYY-MM)
    Days {
        month: String,

        /// Alternate date-tree root
        #[arg(long)]
        archive_root: Option<String>,
    },

    /// List the snapshots of a day, or of the latest directory
    Snapshots {
        /// Day (YYYY-MM-DD)
        #[arg(required_unless_present = "latest")]
        date: Option<NaiveDate>,

        #[arg(long, conflicts_with = "date")]
        latest: bool,

        /// Alternate date-tree root
        #[arg(long)]
        archive_root: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    /// Oldest first (event onset)
    Ascending,
    /// Newest first (most recent event)
    Descending,
}

impl From<Direction> for Traversal {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Ascending => Traversal::Ascending,
            Direction::Descending => Traversal::Descending,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct ScanArgs {
    /// Scan profile name; ad hoc flags are used when omitted
    pub profile: Option<String>,

    #[command(flatten)]
    pub adhoc: AdHocScan,
}

/// An ad hoc scan described entirely by flags.
#[derive(Args, Debug, Default)]
pub struct AdHocScan {
    /// Single day
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// First day of a range (with --to)
    #[arg(long, requires = "to")]
    pub from: Option<NaiveDate>,

    /// Last day of a range, inclusive (with --from)
    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,

    /// Whole month (YYYY-MM)
    #[arg(long)]
    pub month: Option<String>,

    /// Current month and the months before it
    #[arg(long)]
    pub recent_months: Option<u32>,

    #[arg(long, value_enum)]
    pub traversal: Option<Direction>,

    /// Region name or "min_lat,max_lat,min_lon,max_lon"
    #[arg(long)]
    pub region: Option<String>,

    /// Match when the regional maximum is strictly above this (mm/h)
    #[arg(long)]
    pub threshold: Option<f32>,

    /// all | every:K | midpoint | fixed:first,middle,last,N
    #[arg(long)]
    pub sampling: Option<SamplingStrategy>,

    /// Probe at most this many days per month
    #[arg(long)]
    pub max_days: Option<usize>,

    /// Alternate date-tree root
    #[arg(long)]
    pub archive_root: Option<String>,
}

impl AdHocScan {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.from.is_none()
            && self.month.is_none()
            && self.recent_months.is_none()
            && self.traversal.is_none()
            && self.region.is_none()
            && self.threshold.is_none()
            && self.sampling.is_none()
            && self.max_days.is_none()
            && self.archive_root.is_none()
    }

    /// Exactly one window flag must be set.
    pub fn window(&self, today: NaiveDate) -> Result<TimeWindow> {
        let mut windows = Vec::new();
        if let Some(date) = self.date {
            windows.push(TimeWindow::Date(date));
        }
        if let (Some(start), Some(end)) = (self.from, self.to) {
            windows.push(TimeWindow::DateRange { start, end });
        }
        if let Some(month) = &self.month {
            windows.push(TimeWindow::Month(YearMonth::parse(month)?));
        }
        if let Some(count) = self.recent_months {
            windows.push(TimeWindow::RecentMonths { count, anchor: today });
        }

        match windows.as_slice() {
            [window] => Ok(*window),
            [] => bail!("a time window is required: --date, --from/--to, --month or --recent-months"),
            _ => bail!("only one of --date, --from/--to, --month or --recent-months may be given"),
        }
    }
}
