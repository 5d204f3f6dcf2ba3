//! GSMaP grid decoder.
//!
//! A snapshot is a gzip stream wrapping exactly 1200 x 3600 little-endian
//! `f32` values in row-major order, 60°N to 60°S and 0°E to 360°E at 0.1°.
//!
//! ```ignore
//! let grid = gsmap_parser::decode_compressed(&compressed)?;
//! let peak = grid.max_in(&rain_common::regions::QUEZON_CITY);
//! ```

mod decode;
mod decompress;
pub mod error;
pub mod grid;

pub use decode::{decode, decode_compressed, normalize, GRID_BYTES, MAX_VALID_INTENSITY};
pub use decompress::decompress_gzip;
pub use error::{ParseError, Result};
pub use grid::{Grid, GridWindow, WindowStats};
