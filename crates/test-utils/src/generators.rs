//! Synthetic snapshot payloads.
//!
//! A payload is a full 1200 x 3600 little-endian f32 grid of zeros with a few
//! cells set, optionally gzip-wrapped the way the archive serves it.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use rain_common::grid::{lat_to_row, lon_to_col};
use rain_common::{GRID_COLS, GRID_LEN};

/// One cell value to plant in a grid: `(row, col, value)`.
pub type Cell = (usize, usize, f32);

/// Grid index of the cell containing `(lat, lon)`.
///
/// # Example
///
/// ```
/// use test_utils::cell_at;
///
/// assert_eq!(cell_at(14.75, 121.15), (452, 1211));
/// ```
pub fn cell_at(lat: f64, lon: f64) -> (usize, usize) {
    (lat_to_row(lat) as usize, lon_to_col(lon) as usize)
}

/// Row-major values with the given cells set and zero elsewhere.
pub fn grid_values(cells: &[Cell]) -> Vec<f32> {
    let mut values = vec![0.0_f32; GRID_LEN];
    for &(row, col, value) in cells {
        values[row * GRID_COLS + col] = value;
    }
    values
}

/// Uncompressed snapshot bytes.
pub fn grid_bytes(cells: &[Cell]) -> Vec<u8> {
    grid_values(cells)
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect()
}

/// Gzip-compress a buffer.
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(data).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

/// Gzip-wrapped snapshot bytes, as served by the archive.
pub fn snapshot_payload(cells: &[Cell]) -> Vec<u8> {
    gzip(&grid_bytes(cells))
}

/// Payload with a single wet cell at the center of Quezon City.
pub fn quezon_city_rain(intensity: f32) -> Vec<u8> {
    let (row, col) = cell_at(14.75, 121.15);
    snapshot_payload(&[(row, col, intensity)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rain_common::GRID_ROWS;

    #[test]
    fn test_grid_bytes_length() {
        assert_eq!(grid_bytes(&[]).len(), GRID_ROWS * GRID_COLS * 4);
    }

    #[test]
    fn test_planted_cell_position() {
        let bytes = grid_bytes(&[(1, 2, 3.5)]);
        let offset = (GRID_COLS + 2) * 4;
        let value = f32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ]);
        assert_eq!(value, 3.5);
    }

    #[test]
    fn test_payload_is_much_smaller_than_grid() {
        assert!(quezon_city_rain(1.0).len() < GRID_LEN);
    }
}
