//! Named scan configurations.
//!
//! Each profile is a YAML document in `config/scans/`:
//!
//! ```yaml
//! name: find_heavy_rain
//! window:
//!   range: { start: 2024-11-15, end: 2024-11-20 }
//! traversal: ascending
//! region: qc
//! threshold: 1.0
//! sampling: "every:2"
//! ```

use std::path::Path;

use chrono::NaiveDate;
use rain_common::{regions, BoundingBox, YearMonth};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, ScanError};
use crate::sampling::SamplingStrategy;
use crate::scanner::ScanRequest;
use crate::window::{TimeWindow, Traversal};

/// One scan profile as written in YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProfile {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(with = "serde_yaml::with::singleton_map")]
    pub window: WindowSpec,

    /// Required: the direction decides whether the onset or the latest event is found.
    pub traversal: Traversal,

    pub region: RegionSpec,

    pub threshold: f32,

    #[serde(default)]
    pub sampling: SamplingStrategy,

    #[serde(default)]
    pub max_days_per_period: Option<usize>,

    /// Alternate date-tree root, e.g. a reprocessed product
    #[serde(default)]
    pub archive_root: Option<String>,
}

/// Time window as written in a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSpec {
    Date(NaiveDate),
    Range { start: NaiveDate, end: NaiveDate },
    /// `YYYY-MM`
    Month(String),
    /// Months up to and including the day the scan runs.
    RecentMonths { count: u32 },
}

impl WindowSpec {
    pub fn resolve(&self, today: NaiveDate) -> Result<TimeWindow> {
        let window = match self {
            WindowSpec::Date(date) => TimeWindow::Date(*date),
            WindowSpec::Range { start, end } => TimeWindow::DateRange {
                start: *start,
                end: *end,
            },
            WindowSpec::Month(month) => TimeWindow::Month(
                YearMonth::parse(month).map_err(|e| ScanError::Configuration(e.to_string()))?,
            ),
            WindowSpec::RecentMonths { count } => TimeWindow::RecentMonths {
                count: *count,
                anchor: today,
            },
        };
        window.validate().map_err(ScanError::Configuration)?;
        Ok(window)
    }
}

/// A region by name, as a `"min_lat,max_lat,min_lon,max_lon"` string, or as a box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegionSpec {
    Bounds(BoundingBox),
    Named(String),
}

impl RegionSpec {
    pub fn resolve(&self) -> Result<BoundingBox> {
        match self {
            RegionSpec::Bounds(bbox) => Ok(*bbox),
            RegionSpec::Named(name) => regions::by_name(name)
                .map(Ok)
                .unwrap_or_else(|| BoundingBox::from_region_string(name))
                .map_err(|e| ScanError::Configuration(format!("region '{name}': {e}"))),
        }
    }
}

impl ScanProfile {
    /// Parse a profile from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| ScanError::Configuration(e.to_string()))
    }

    /// Load a profile file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ScanError::Profile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_yaml::from_str(&text).map_err(|e| ScanError::Profile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Build a validated request. `today` anchors `recent_months` windows.
    pub fn to_request(&self, today: NaiveDate) -> Result<ScanRequest> {
        let request = ScanRequest {
            window: self.window.resolve(today)?,
            traversal: self.traversal,
            region: self.region.resolve()?,
            threshold: self.threshold,
            sampling: self.sampling.clone(),
            max_days_per_period: self.max_days_per_period,
            archive_root: self.archive_root.clone(),
        };
        request
            .validate()
            .map_err(|e| ScanError::Configuration(format!("profile '{}': {e}", self.name)))?;
        Ok(request)
    }
}

/// Load every `*.yaml`/`*.yml` profile in a directory, sorted by name.
///
/// A missing directory yields no profiles. Files that fail to parse are
/// skipped with a warning.
pub fn load_profiles(dir: &Path) -> Result<Vec<ScanProfile>> {
    if !dir.exists() {
        warn!(path = %dir.display(), "Scan profile directory not found");
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| ScanError::Profile {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut profiles = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path
            .extension()
            .map_or(false, |ext| ext == "yaml" || ext == "yml")
        {
            continue;
        }
        match ScanProfile::load(&path) {
            Ok(profile) => {
                debug!(profile = %profile.name, path = %path.display(), "Loaded scan profile");
                profiles.push(profile);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load scan profile");
            }
        }
    }

    profiles.sort_by(|a, b| a.name.cmp(&b.name));
    info!(count = profiles.len(), "Loaded scan profiles");
    Ok(profiles)
}

/// Find a profile by name in a directory.
pub fn find_profile(dir: &Path, name: &str) -> Result<ScanProfile> {
    load_profiles(dir)?
        .into_iter()
        .find(|p| p.name == name)
        .ok_or_else(|| {
            ScanError::Configuration(format!("no scan profile named '{name}' in {}", dir.display()))
        })
}
