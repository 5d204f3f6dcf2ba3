//! Geometry of the GSMaP 0.1° global grid.
//!
//! Row 0 is the northern edge at 60°N and rows advance southward; column 0
//! is 0°E and columns advance eastward. A cell is addressed by its north-west
//! reference corner and spans `[lat - 0.1, lat] x [lon, lon + 0.1]`.

use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// Number of latitude rows (60°N to 60°S).
pub const GRID_ROWS: usize = 1200;
/// Number of longitude columns (0°E to 360°E).
pub const GRID_COLS: usize = 3600;
/// Total number of cells.
pub const GRID_LEN: usize = GRID_ROWS * GRID_COLS;
/// Cell size in degrees.
pub const RESOLUTION_DEG: f64 = 0.1;
/// Latitude of the northern edge of row 0.
pub const NORTH_EDGE_LAT: f64 = 60.0;

/// Fraction of a cell added before flooring, so that coordinates sitting on a
/// cell edge map to the cell they name even when 0.1 is not exact in binary.
const EDGE_TOLERANCE: f64 = 1e-9;

/// Row index for a latitude: `floor((60 - lat) / 0.1)`. Unclamped.
pub fn lat_to_row(lat: f64) -> i64 {
    ((NORTH_EDGE_LAT - lat) / RESOLUTION_DEG + EDGE_TOLERANCE).floor() as i64
}

/// Column index for a longitude: `floor(lon / 0.1)`. Unclamped.
pub fn lon_to_col(lon: f64) -> i64 {
    (lon / RESOLUTION_DEG + EDGE_TOLERANCE).floor() as i64
}

/// Latitude of the reference (northern) edge of a row.
pub fn row_to_lat(row: usize) -> f64 {
    round_micro(NORTH_EDGE_LAT - row as f64 * RESOLUTION_DEG)
}

/// Longitude of the reference (western) edge of a column.
pub fn col_to_lon(col: usize) -> f64 {
    round_micro(col as f64 * RESOLUTION_DEG)
}

/// Round to 1e-6 degrees so serialized coordinates read as the decimals they are.
fn round_micro(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

fn clamp_index(index: i64, upper: usize) -> usize {
    index.clamp(0, upper as i64) as usize
}

/// A half-open range of grid indices `[row_start, row_end) x [col_start, col_end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexWindow {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl IndexWindow {
    /// The whole grid.
    pub fn full() -> Self {
        Self {
            row_start: 0,
            row_end: GRID_ROWS,
            col_start: 0,
            col_end: GRID_COLS,
        }
    }

    /// Translate a bounding box to grid indices, clamped to the grid.
    ///
    /// The northern edge (`max_lat`) gives the first row and the southern edge
    /// (`min_lat`) the exclusive last row; likewise `min_lon`/`max_lon` for
    /// columns. A box that does not intersect the grid yields an empty window.
    pub fn from_bbox(bbox: &BoundingBox) -> Self {
        let row_start = clamp_index(lat_to_row(bbox.max_lat), GRID_ROWS);
        let row_end = clamp_index(lat_to_row(bbox.min_lat), GRID_ROWS).max(row_start);
        let col_start = clamp_index(lon_to_col(bbox.min_lon), GRID_COLS);
        let col_end = clamp_index(lon_to_col(bbox.max_lon), GRID_COLS).max(col_start);

        Self {
            row_start,
            row_end,
            col_start,
            col_end,
        }
    }

    /// Number of rows covered.
    pub fn rows(&self) -> usize {
        self.row_end - self.row_start
    }

    /// Number of columns covered.
    pub fn cols(&self) -> usize {
        self.col_end - self.col_start
    }

    /// Number of cells covered.
    pub fn len(&self) -> usize {
        self.rows() * self.cols()
    }

    /// Check if the window covers no cells.
    pub fn is_empty(&self) -> bool {
        self.rows() == 0 || self.cols() == 0
    }
}

/// The geographic reference corner of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellCoord {
    pub lat: f64,
    pub lon: f64,
}

impl CellCoord {
    /// Reference corner of the cell at `(row, col)`.
    pub fn from_index(row: usize, col: usize) -> Self {
        Self {
            lat: row_to_lat(row),
            lon: col_to_lon(col),
        }
    }

    /// Grid index of the cell containing this coordinate, if on the grid.
    pub fn to_index(&self) -> Option<(usize, usize)> {
        let row = lat_to_row(self.lat);
        let col = lon_to_col(self.lon);
        if row < 0 || col < 0 || row >= GRID_ROWS as i64 || col >= GRID_COLS as i64 {
            return None;
        }
        Some((row as usize, col as usize))
    }

    /// Closed ring `[lon, lat]` tracing the cell clockwise from its reference corner.
    pub fn ring(&self) -> [[f64; 2]; 5] {
        let east = round_micro(self.lon + RESOLUTION_DEG);
        let south = round_micro(self.lat - RESOLUTION_DEG);
        [
            [self.lon, self.lat],
            [east, self.lat],
            [east, south],
            [self.lon, south],
            [self.lon, self.lat],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions;

    #[test]
    fn test_edges_map_to_named_cells() {
        assert_eq!(lat_to_row(60.0), 0);
        assert_eq!(lat_to_row(15.0), 450);
        assert_eq!(lat_to_row(14.0), 460);
        assert_eq!(lon_to_col(0.0), 0);
        assert_eq!(lon_to_col(120.5), 1205);
        assert_eq!(lon_to_col(121.5), 1215);
    }

    #[test]
    fn test_inexact_edge_rounds_up_to_named_row() {
        // (60 - 14.6) / 0.1 is 453.99999999999994 in f64
        assert_eq!(((NORTH_EDGE_LAT - 14.6) / RESOLUTION_DEG).floor() as i64, 453);
        assert_eq!(lat_to_row(14.6), 454);

        let window = IndexWindow::from_bbox(&regions::QUEZON_CITY);
        assert_eq!((window.row_start, window.row_end), (452, 454));
        assert_eq!((window.col_start, window.col_end), (1210, 1212));
        assert_eq!(window.len(), 4);
    }

    #[test]
    fn test_index_coord_round_trip() {
        for row in (0..GRID_ROWS).step_by(7) {
            for col in (0..GRID_COLS).step_by(13) {
                let coord = CellCoord::from_index(row, col);
                assert_eq!(coord.to_index(), Some((row, col)));
            }
        }
    }

    #[test]
    fn test_coord_index_coord_within_one_cell() {
        let mut lat = -59.95;
        while lat < 60.0 {
            let mut lon = 0.03;
            while lon < 360.0 {
                let (row, col) = CellCoord { lat, lon }.to_index().unwrap();
                let corner = CellCoord::from_index(row, col);
                assert!(corner.lat + 1e-9 >= lat && corner.lat - lat <= RESOLUTION_DEG + 1e-9);
                assert!(corner.lon <= lon + 1e-9 && lon - corner.lon <= RESOLUTION_DEG + 1e-9);
                lon += 7.37;
            }
            lat += 3.17;
        }
    }

    #[test]
    fn test_window_from_reference_region() {
        let window = IndexWindow::from_bbox(&regions::QUEZON_CITY_CONTEXT);
        assert_eq!(window.row_start, 450);
        assert_eq!(window.row_end, 460);
        assert_eq!(window.col_start, 1205);
        assert_eq!(window.col_end, 1215);
        assert_eq!(window.len(), 100);
    }

    #[test]
    fn test_window_clamped_to_grid() {
        let window = IndexWindow::from_bbox(&BoundingBox::new(-80.0, 80.0, -10.0, 400.0));
        assert_eq!(window, IndexWindow::full());
    }

    #[test]
    fn test_window_outside_grid_is_empty() {
        let window = IndexWindow::from_bbox(&BoundingBox::new(70.0, 80.0, 10.0, 20.0));
        assert!(window.is_empty());
        assert_eq!(window.len(), 0);
    }

    #[test]
    fn test_ring_is_closed() {
        let ring = CellCoord::from_index(450, 1205).ring();
        assert_eq!(ring[0], ring[4]);
        assert_eq!(ring[0], [120.5, 15.0]);
        assert_eq!(ring[2], [120.6, 14.9]);
    }
}
