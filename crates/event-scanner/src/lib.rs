//! Regional threshold event search over the snapshot archive.
//!
//! An [`EventScanner`] walks a [`TimeWindow`] month by month and day by day
//! in the declared [`Traversal`] order, probes the snapshots a
//! [`SamplingStrategy`] selects, and stops at the first snapshot whose
//! maximum inside the region exceeds the threshold.
//!
//! Historical one-off scans live on as [`ScanProfile`] YAML files.

pub mod error;
pub mod profile;
pub mod sampling;
pub mod scanner;
pub mod window;

pub use error::{ProbeError, Result, ScanError};
pub use profile::{find_profile, load_profiles, RegionSpec, ScanProfile, WindowSpec};
pub use sampling::{SampleOffset, SamplingStrategy};
pub use scanner::{
    EventScanner, ScanMatch, ScanPhase, ScanReport, ScanRequest, ScanResult, ScanStats,
};
pub use window::{TimeWindow, Traversal};
