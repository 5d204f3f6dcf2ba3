//! Regional rainfall artifact.
//!
//! A sync picks exactly one snapshot (the newest, or one for a given date and
//! hour), decodes it and writes every cell of the reference window as a
//! GeoJSON polygon. The artifact is replaced wholesale each time; readers get
//! it back through [`ArtifactCache::latest`].

pub mod config;
pub mod error;
pub mod feature;
pub mod store;
pub mod sync;
pub mod target;

pub use config::{RainwatchConfig, SyncConfig};
pub use error::{ArtifactError, Result, SyncError};
pub use feature::{build_collection, CellFeature, CellGeometry, CellProperties, RainfallCollection};
pub use store::ArtifactStore;
pub use sync::{ArtifactCache, SyncOutcome, SyncStatus, SyncSummary};
pub use target::SyncTarget;
