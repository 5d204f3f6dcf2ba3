//! Common types shared across the rainfall archive crates and services.

pub mod bbox;
pub mod config;
pub mod error;
pub mod grid;
pub mod time;

pub use bbox::{regions, BboxParseError, BoundingBox};
pub use config::{expand_env_vars, load_yaml};
pub use error::{ErrorKind, RainError, RainResult};
pub use grid::{CellCoord, IndexWindow, GRID_COLS, GRID_LEN, GRID_ROWS, RESOLUTION_DEG};
pub use time::{DayPath, SnapshotId, TimeParseError, YearMonth};
